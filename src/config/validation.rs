//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check URL-valued settings parse
//! - Check path settings are absolute
//! - Validate value ranges (timeouts > 0, bounded onboarding window)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::uri::Authority;
use thiserror::Error;
use url::Url;

use crate::config::schema::EdgeConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: `{value}` is not a valid URL")]
    InvalidUrl { field: String, value: String },

    #[error("{field}: `{value}` must start with `/`")]
    RelativePath { field: String, value: String },

    #[error("{field}: `{value}` must be a bare host (no scheme or path)")]
    InvalidHost { field: String, value: String },

    #[error("{field}: `{value}` is not a valid host:port")]
    InvalidAddress { field: String, value: String },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: String },

    #[error("{field}: unsupported value `{value}`")]
    Unsupported { field: String, value: String },

    #[error("{field}: `{value}` exceeds the maximum of {max}")]
    TooLarge { field: String, value: i64, max: i64 },
}

/// Longest accepted onboarding window (one day).
pub const MAX_ONBOARDING_WINDOW_SECS: i64 = 86_400;

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "upstream.app_address", &config.upstream.app_address);

    if !matches!(config.listener.public_scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::Unsupported {
            field: "listener.public_scheme".into(),
            value: config.listener.public_scheme.clone(),
        });
    }

    for (field, value) in [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.session_decode_ms", config.timeouts.session_decode_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue { field: field.into() });
        }
    }
    let window = config.session.onboarding_window_secs;
    if window <= 0 {
        errors.push(ValidationError::ZeroValue {
            field: "session.onboarding_window_secs".into(),
        });
    } else if window > MAX_ONBOARDING_WINDOW_SECS {
        errors.push(ValidationError::TooLarge {
            field: "session.onboarding_window_secs".into(),
            value: window,
            max: MAX_ONBOARDING_WINDOW_SECS,
        });
    }

    if let Some(url) = &config.hosts.auth_url {
        check_url(&mut errors, "hosts.auth_url", url);
    }
    if let Some(url) = &config.hosts.base_url {
        check_url(&mut errors, "hosts.base_url", url);
    }

    let paths = &config.paths;
    for (field, value) in [
        ("paths.analytics_prefix", &paths.analytics_prefix),
        ("paths.webhook_prefix", &paths.webhook_prefix),
        ("paths.view_prefix", &paths.view_prefix),
        ("paths.not_found_path", &paths.not_found_path),
        ("session.login_path", &config.session.login_path),
        ("session.onboarding_path", &config.session.onboarding_path),
        ("session.dashboard_path", &config.session.dashboard_path),
        ("session.confirm_email_change_path", &config.session.confirm_email_change_path),
        ("webhooks.api_namespace", &config.webhooks.api_namespace),
        ("domains.viewer_namespace", &config.domains.viewer_namespace),
    ] {
        check_path(&mut errors, field, value);
    }
    for (field, list) in [
        ("paths.public_prefixes", &paths.public_prefixes),
        ("paths.app_routes", &paths.app_routes),
        ("paths.blocked_pathnames", &paths.blocked_pathnames),
        ("paths.excluded_prefixes", &paths.excluded_prefixes),
    ] {
        for value in list {
            check_path(&mut errors, field, value);
        }
    }

    if !matches!(config.session.algorithm.as_str(), "HS256" | "HS384" | "HS512") {
        errors.push(ValidationError::Unsupported {
            field: "session.algorithm".into(),
            value: config.session.algorithm.clone(),
        });
    }

    if let Some(host) = &config.webhooks.base_host {
        check_host(&mut errors, "webhooks.base_host", host);
    }
    if let Some(host) = &config.redirects.app_base_host {
        check_host(&mut errors, "redirects.app_base_host", host);
    }
    for host in [&config.analytics.api_host, &config.analytics.assets_host] {
        check_host(&mut errors, "analytics", host);
    }

    check_url(&mut errors, "domains.fallback_landing", &config.domains.fallback_landing);
    for (host, url) in &config.domains.landing_pages {
        check_url(&mut errors, &format!("domains.landing_pages.{}", host), url);
    }

    for (i, rule) in config.redirects.rules.iter().enumerate() {
        check_path(&mut errors, &format!("redirects.rules[{}].source", i), &rule.source);
        if !rule.destination.starts_with('/') && Url::parse(&rule.destination).is_err() {
            errors.push(ValidationError::InvalidUrl {
                field: format!("redirects.rules[{}].destination", i),
                value: rule.destination.clone(),
            });
        }
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::Unsupported {
                field: "admin.api_key".into(),
                value: String::new(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    let valid = Url::parse(value).map(|u| u.has_host()).unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field: field.into(),
            value: value.into(),
        });
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            field: field.into(),
            value: value.into(),
        });
    }
}

fn check_host(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.is_empty() || value.contains('/') || value.contains("://") {
        errors.push(ValidationError::InvalidHost {
            field: field.into(),
            value: value.into(),
        });
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    let valid = value
        .parse::<Authority>()
        .map(|a| a.port_u16().is_some())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidAddress {
            field: field.into(),
            value: value.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&EdgeConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EdgeConfig::default();
        config.hosts.base_url = Some("not a url".into());
        config.paths.view_prefix = "view/".into();
        config.webhooks.base_host = Some("https://hooks.example.com".into());
        config.timeouts.session_decode_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroValue {
            field: "timeouts.session_decode_ms".into()
        }));
    }

    #[test]
    fn test_enabled_admin_needs_key() {
        let mut config = EdgeConfig::default();
        config.admin.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("admin.api_key"));
    }

    #[test]
    fn test_upstream_needs_port() {
        let mut config = EdgeConfig::default();
        config.upstream.app_address = "renderer".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_onboarding_window_is_bounded() {
        let mut config = EdgeConfig::default();
        config.session.onboarding_window_secs = i64::MAX;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::TooLarge {
                field: "session.onboarding_window_secs".into(),
                value: i64::MAX,
                max: MAX_ONBOARDING_WINDOW_SECS,
            }])
        );

        config.session.onboarding_window_secs = MAX_ONBOARDING_WINDOW_SECS;
        assert_eq!(validate_config(&config), Ok(()));
    }
}
