//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge router.
//! All types derive Serde traits for deserialization from config files. Every
//! behaviour switch is a named field here; nothing in the routing layer reads
//! the process environment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the edge router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Deployment flavour. Changes host classification and header policy.
    pub mode: Mode,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where rewritten and passed-through requests are forwarded.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Own-domain recognition.
    pub hosts: HostConfig,

    /// Path namespaces and blocklists.
    pub paths: PathConfig,

    /// Session cookie decoding and auth flow paths.
    pub session: SessionConfig,

    /// Inbound webhook host.
    pub webhooks: WebhookConfig,

    /// Custom-domain rewriting.
    pub domains: DomainConfig,

    /// Analytics ingestion forwarding.
    pub analytics: AnalyticsConfig,

    /// Static redirects evaluated ahead of the router.
    pub redirects: RedirectConfig,

    /// Response security headers.
    pub security: SecurityConfig,

    /// Passkey provider tenant.
    pub passkey: PasskeyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Deployment flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Production,
    Development,
}

impl Mode {
    pub fn is_development(self) -> bool {
        self == Mode::Development
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Mode::Production),
            "development" | "dev" => Ok(Mode::Development),
            other => Err(format!("unknown mode `{}`", other)),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Scheme clients used to reach us. Redirect targets are built with it.
    pub public_scheme: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            public_scheme: "https".to_string(),
        }
    }
}

/// Upstream application renderer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Renderer address (e.g., "127.0.0.1:3000").
    pub app_address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            app_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Upper bound on a single upstream exchange in seconds.
    pub upstream_secs: u64,

    /// Upper bound on session token decoding in milliseconds.
    pub session_decode_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 25,
            session_decode_ms: 250,
        }
    }
}

/// Own-domain recognition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    /// Substrings identifying the application's own domains.
    pub app_domains: Vec<String>,

    /// Hosting-platform suffixes (preview deployments).
    pub platform_suffixes: Vec<String>,

    /// Auth base URL; its hostname is an own domain.
    pub auth_url: Option<String>,

    /// Public base URL; its hostname is an own domain.
    pub base_url: Option<String>,

    /// In development mode, only hosts containing one of these are custom domains.
    pub development_custom_domains: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            app_domains: vec!["papermark.io".to_string(), "papermark.com".to_string()],
            platform_suffixes: vec![".vercel.app".to_string()],
            auth_url: None,
            base_url: None,
            development_custom_domains: vec![".local".to_string(), "papermark.dev".to_string()],
        }
    }
}

/// Path namespaces and blocklists.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathConfig {
    /// Analytics ingestion namespace.
    pub analytics_prefix: String,

    /// Inbound webhook namespace on the webhook host.
    pub webhook_prefix: String,

    /// Public viewer namespace.
    pub view_prefix: String,

    /// Prefixes handled without authentication on own domains.
    pub public_prefixes: Vec<String>,

    /// App route roots never rewritten on custom domains.
    pub app_routes: Vec<String>,

    /// Pathnames refused outright.
    pub blocked_pathnames: Vec<String>,

    /// Prefixes the router never looks at.
    pub excluded_prefixes: Vec<String>,

    /// Page served for refused paths.
    pub not_found_path: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            analytics_prefix: "/ingest/".to_string(),
            webhook_prefix: "/services/".to_string(),
            view_prefix: "/view/".to_string(),
            public_prefixes: vec![
                "/view/".to_string(),
                "/verify".to_string(),
                "/unsubscribe".to_string(),
            ],
            app_routes: vec![
                "/dashboard".to_string(),
                "/settings".to_string(),
                "/login".to_string(),
                "/welcome".to_string(),
                "/auth".to_string(),
            ],
            blocked_pathnames: vec![
                "/phpmyadmin".to_string(),
                "/server-status".to_string(),
                "/wordpress".to_string(),
                "/_all_dbs".to_string(),
                "/_debug_toolbar".to_string(),
                "/wp-admin".to_string(),
                "/wp-login".to_string(),
                "/xmlrpc".to_string(),
            ],
            excluded_prefixes: vec![
                "/api/".to_string(),
                "/_next/".to_string(),
                "/_static".to_string(),
                "/vendor".to_string(),
                "/_icons".to_string(),
                "/_vercel".to_string(),
                "/favicon.ico".to_string(),
                "/sitemap.xml".to_string(),
            ],
            not_found_path: "/404".to_string(),
        }
    }
}

/// Session cookie decoding and auth flow paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie carrying the session token.
    pub cookie_name: String,

    /// Shared signing secret. Empty means no session ever decodes.
    pub secret: String,

    /// JWT signature algorithm (HS256, HS384, HS512).
    pub algorithm: String,

    pub login_path: String,
    pub onboarding_path: String,
    pub dashboard_path: String,

    /// Path whose query string is carried into `next` on login redirects.
    pub confirm_email_change_path: String,

    /// Query parameter marking an invited user.
    pub invitation_param: String,

    /// Accounts younger than this are sent to onboarding.
    pub onboarding_window_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "next-auth.session-token".to_string(),
            secret: String::new(),
            algorithm: "HS256".to_string(),
            login_path: "/login".to_string(),
            onboarding_path: "/welcome".to_string(),
            dashboard_path: "/dashboard".to_string(),
            confirm_email_change_path: "/auth/confirm-email-change".to_string(),
            invitation_param: "invitation".to_string(),
            onboarding_window_secs: 10,
        }
    }
}

/// Inbound webhook host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Dedicated webhook host. Unset disables webhook forwarding.
    pub base_host: Option<String>,

    /// Internal namespace webhook paths are rewritten under.
    pub api_namespace: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            base_host: None,
            api_namespace: "/api/webhooks".to_string(),
        }
    }
}

/// Custom-domain rewriting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Internal viewer namespace, joined with `/{host}{path}`.
    pub viewer_namespace: String,

    /// Root-path landing page per custom host.
    pub landing_pages: BTreeMap<String, String>,

    /// Landing page for custom hosts without an entry.
    pub fallback_landing: String,

    /// Value of the product-identifying header on rewritten responses.
    pub powered_by: String,
}

impl Default for DomainConfig {
    fn default() -> Self {
        let landing_pages = [
            ("guide.permithealth.com", "https://guide.permithealth.com/faq"),
            ("fund.tradeair.in", "https://tradeair.in/sv-fm-inbound"),
            ("docs.pashupaticapital.com", "https://www.pashupaticapital.com/"),
        ]
        .into_iter()
        .map(|(h, u)| (h.to_string(), u.to_string()))
        .collect();

        Self {
            viewer_namespace: "/view/domains".to_string(),
            landing_pages,
            fallback_landing: "https://www.papermark.com/home".to_string(),
            powered_by: "Papermark.io - Document sharing infrastructure for the modern web"
                .to_string(),
        }
    }
}

/// Analytics ingestion forwarding.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Event capture host.
    pub api_host: String,

    /// Static asset host.
    pub assets_host: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            api_host: "eu.i.posthog.com".to_string(),
            assets_host: "eu-assets.i.posthog.com".to_string(),
        }
    }
}

/// Static redirects evaluated ahead of the router.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// When set, `/` on this host goes to the dashboard.
    pub app_base_host: Option<String>,

    /// Additional exact-path redirects.
    pub rules: Vec<RedirectRule>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            app_base_host: None,
            rules: vec![RedirectRule {
                source: "/settings".to_string(),
                destination: "/settings/general".to_string(),
                permanent: false,
                host: None,
            }],
        }
    }
}

/// One exact-path redirect.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedirectRule {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub permanent: bool,
    /// Only applies when the request host equals this.
    #[serde(default)]
    pub host: Option<String>,
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,

    /// CSP violation report endpoint.
    pub csp_report_uri: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            csp_report_uri: "/api/csp-report".to_string(),
        }
    }
}

/// Passkey provider tenant.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PasskeyConfig {
    pub api_key: Option<String>,
    pub tenant_id: Option<String>,
    /// Override for self-hosted tenants.
    pub api_base: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "papermark_edge=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

impl EdgeConfig {
    /// Copy with every secret replaced, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.session.secret.is_empty() {
            copy.session.secret = REDACTED.to_string();
        }
        if !copy.admin.api_key.is_empty() {
            copy.admin.api_key = REDACTED.to_string();
        }
        if copy.passkey.api_key.is_some() {
            copy.passkey.api_key = Some(REDACTED.to_string());
        }
        copy
    }
}

const REDACTED: &str = "[redacted]";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: EdgeConfig = toml::from_str("mode = \"development\"").unwrap();
        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.session.cookie_name, "next-auth.session-token");
        assert_eq!(config.paths.analytics_prefix, "/ingest/");
        assert_eq!(config.domains.landing_pages.len(), 3);
    }

    #[test]
    fn test_nested_override() {
        let raw = r#"
            [webhooks]
            base_host = "hooks.papermark.com"

            [[redirects.rules]]
            source = "/view/old"
            destination = "/view/new"
        "#;
        let config: EdgeConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.webhooks.base_host.as_deref(), Some("hooks.papermark.com"));
        assert_eq!(config.webhooks.api_namespace, "/api/webhooks");
        // An explicit rules table replaces the default list.
        assert_eq!(config.redirects.rules.len(), 1);
        assert!(!config.redirects.rules[0].permanent);
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut config = EdgeConfig::default();
        config.session.secret = "s3cret".into();
        config.passkey.api_key = Some("key".into());
        let shown = config.redacted();
        assert_eq!(shown.session.secret, "[redacted]");
        assert_eq!(shown.passkey.api_key.as_deref(), Some("[redacted]"));
        assert!(shown.admin.api_key.is_empty());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("DEV".parse::<Mode>().unwrap(), Mode::Development);
        assert_eq!("production".parse::<Mode>().unwrap(), Mode::Production);
        assert!("staging".parse::<Mode>().is_err());
    }
}
