//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! IncomingRequest (host, path, query, cookies) + Option<SessionToken>
//!     → dispatcher.rs (branch selection)
//!         → host.rs / path.rs (classification)
//!         → analytics.rs | redirects.rs | webhook.rs | domain.rs | app.rs
//!     → RoutingDecision {Continue, Redirect, Rewrite, NotFound}
//!
//! Compilation (at startup and on reload):
//!     EdgeConfig
//!     → validate
//!     → compile classifiers, rule tables, landing URLs
//!     → freeze as immutable Dispatcher
//! ```
//!
//! # Design Decisions
//! - Decisions are plain values; only the HTTP layer turns them into responses
//! - No regex in the hot path (prefix, suffix and exact matches)
//! - Deterministic: same input always yields the same decision

pub mod analytics;
pub mod app;
pub mod decision;
pub mod dispatcher;
pub mod domain;
pub mod host;
pub mod path;
pub mod redirects;
pub mod request;
pub mod webhook;

pub use decision::{Branch, Destination, Routed, RoutingDecision};
pub use dispatcher::Dispatcher;
pub use host::{classify_host, HostClassifier, HostKind};
pub use path::{classify_path, PathClassifier, PathKind};
pub use request::IncomingRequest;
pub use webhook::is_webhook_path;
