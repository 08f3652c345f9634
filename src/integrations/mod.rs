//! Third-party service settings built once at startup.

pub mod passkey;

pub use passkey::{PasskeyError, PasskeyTenant};
