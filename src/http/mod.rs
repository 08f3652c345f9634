//! HTTP boundary subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → request.rs (host, path, query and cookies as an IncomingRequest)
//!     → [routing::Dispatcher decides]
//!     → server.rs (forward upstream, redirect or 404)
//!     → response.rs (redirects, rebuffered bodies, extra headers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, EdgeRuntime, HttpServer, ServerError};
