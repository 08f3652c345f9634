//! Papermark edge router library.
//!
//! Classifies every request by host and path and decides whether it passes
//! through, is rewritten, redirected or answered with 404.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;
pub mod session;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;
pub mod security;

// Platform integrations
pub mod integrations;
pub mod jobs;

pub use config::EdgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Dispatcher;
