//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::EdgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, overlaying the process environment.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: EdgeConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Defaults plus the process environment, for running without a file.
pub fn load_from_env() -> Result<EdgeConfig, ConfigError> {
    let mut config = EdgeConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply the deployment environment variables on top of a parsed config.
///
/// Empty values count as unset.
pub fn apply_env_overrides<F>(config: &mut EdgeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(mode) = get("PAPERMARK_EDGE_MODE") {
        match mode.parse() {
            Ok(mode) => config.mode = mode,
            Err(e) => tracing::warn!(error = %e, "Ignoring PAPERMARK_EDGE_MODE"),
        }
    }
    if let Some(v) = get("NEXTAUTH_URL") {
        config.hosts.auth_url = Some(v);
    }
    if let Some(v) = get("NEXT_PUBLIC_BASE_URL") {
        config.hosts.base_url = Some(v);
    }
    if let Some(v) = get("NEXTAUTH_SECRET") {
        config.session.secret = v;
    }
    if let Some(v) = get("NEXT_PUBLIC_WEBHOOK_BASE_HOST") {
        config.webhooks.base_host = Some(v);
    }
    if let Some(v) = get("NEXT_PUBLIC_APP_BASE_HOST") {
        config.redirects.app_base_host = Some(v);
    }
    if let Some(v) = get("HANKO_API_KEY") {
        config.passkey.api_key = Some(v);
    }
    if let Some(v) = get("NEXT_PUBLIC_HANKO_TENANT_ID") {
        config.passkey.tenant_id = Some(v);
    }
}
