//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, environment overlay)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → compiled into a Dispatcher, shared via ArcSwap
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the compiled Dispatcher
//! ```
//!
//! # Design Decisions
//! - The environment is read once, in the loader; nothing downstream touches it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AdminConfig, AnalyticsConfig, DomainConfig, EdgeConfig, HostConfig, ListenerConfig,
    LogFormat, Mode, ObservabilityConfig, PasskeyConfig, PathConfig, RedirectConfig,
    RedirectRule, SecurityConfig, SessionConfig, TimeoutConfig, UpstreamConfig, WebhookConfig,
};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
