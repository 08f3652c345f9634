//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! session cookie (possibly chunked)
//!     → decoder.rs (signature + expiry check, bounded in time)
//!     → token.rs (claims the router reads: email, user.createdAt)
//!     → Option<SessionToken> handed to the dispatcher
//! ```
//!
//! # Design Decisions
//! - Any decode failure, including a timeout, means "no session"
//! - Decoding sits behind a trait so the HTTP layer can be tested with fakes

pub mod decoder;
pub mod token;

pub use decoder::{decode_with_timeout, JwtSessionDecoder, SessionDecoder, SessionError};
pub use token::{SessionToken, SessionUser};
