//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → edge server and admin server stop accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running task subscribes
//! - Listeners drain in-flight requests via axum's graceful shutdown

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
