//! Header manipulation and security headers.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers before forwarding
//! - Add security response headers
//! - Mark viewer, webhook and unsubscribe pages noindex
//! - Allow framing for embed pages only
//!
//! # Design Decisions
//! - Header values are built once per config, not per request
//! - Development mode relaxes the CSP for plain http and hot reload sockets
//! - Values that fail header validation are dropped with a warning

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::json;

use crate::config::{Mode, SecurityConfig};

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all("connection")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Precomputed response security headers.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    enabled: bool,
    defaults: Vec<(HeaderName, HeaderValue)>,
    embed_csp: Option<HeaderValue>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig, mode: Mode) -> Self {
        let dev = mode.is_development();
        let http = if dev { "http:" } else { "" };
        let connect_extra = if dev { "http: ws: wss:" } else { "" };
        let upgrade = if dev { "" } else { "upgrade-insecure-requests;" };

        let report_to = json!({
            "group": "csp-endpoint",
            "max_age": 10_886_400,
            "endpoints": [{ "url": config.csp_report_uri }],
        })
        .to_string();

        let sources = format!(
            "default-src 'self' https: {http}; \
             script-src 'self' 'unsafe-inline' 'unsafe-eval' https: {http}; \
             style-src 'self' 'unsafe-inline' https: {http}; \
             img-src 'self' data: blob: https: {http}; \
             font-src 'self' data: https: {http}; "
        );
        let report_only = format!(
            "{sources}frame-ancestors 'none'; connect-src 'self' https: {connect_extra}; {upgrade} report-to csp-endpoint;"
        );
        let embed = format!(
            "{sources}frame-ancestors *; connect-src 'self' https: {connect_extra}; {upgrade}"
        );

        let defaults = [
            ("referrer-policy", "no-referrer-when-downgrade".to_string()),
            ("x-dns-prefetch-control", "on".to_string()),
            ("x-frame-options", "SAMEORIGIN".to_string()),
            ("report-to", report_to),
            ("content-security-policy-report-only", report_only),
        ]
        .into_iter()
        .filter_map(|(name, value)| header_pair(name, &value))
        .collect();

        Self {
            enabled: config.enable_headers,
            defaults,
            embed_csp: header_pair("content-security-policy", &embed).map(|(_, v)| v),
        }
    }

    /// Add headers for a response served at `client_path` from `served_path`.
    ///
    /// Headers already present on the response win.
    pub fn apply(&self, client_path: &str, served_path: &str, headers: &mut HeaderMap) {
        if !self.enabled {
            return;
        }

        let embed = is_embed(client_path);
        for (name, value) in &self.defaults {
            if embed && name == "x-frame-options" {
                continue;
            }
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }

        if embed {
            if let Some(csp) = &self.embed_csp {
                headers.insert("content-security-policy", csp.clone());
            }
        }

        if is_noindex(client_path) || is_noindex(served_path) {
            headers.insert("x-robots-tag", HeaderValue::from_static("noindex"));
        }
    }
}

fn header_pair(name: &'static str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    match HeaderValue::from_str(&collapsed) {
        Ok(v) => Some((HeaderName::from_static(name), v)),
        Err(e) => {
            tracing::warn!(header = name, error = %e, "Dropping invalid security header");
            None
        }
    }
}

fn is_embed(path: &str) -> bool {
    path.starts_with("/view/") && path.ends_with("/embed")
}

fn is_noindex(path: &str) -> bool {
    path.starts_with("/view/")
        || path.starts_with("/api/webhooks/services/")
        || path == "/unsubscribe"
}
