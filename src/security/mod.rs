//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarded request:
//!     → headers.rs (strip hop-by-hop headers)
//!     → upstream
//!
//! Outgoing response:
//!     → headers.rs (security headers, noindex, embed CSP)
//!     → client
//! ```
//!
//! # Design Decisions
//! - Headers set by the upstream application are never overwritten
//! - Policy precomputed per configuration

pub mod headers;

pub use headers::{strip_hop_by_hop, SecurityHeaders};
