//! Inbound webhook forwarding.
//!
//! Third parties call a dedicated webhook host. Paths under the services
//! prefix are served by the internal webhook API; everything else on that
//! host is not found.

use crate::config::{PathConfig, WebhookConfig};
use crate::routing::decision::RoutingDecision;
use crate::routing::request::IncomingRequest;

#[derive(Debug, Clone)]
pub struct WebhookForwarder {
    base_host: Option<String>,
    prefix: String,
    namespace: String,
}

impl WebhookForwarder {
    pub fn from_config(paths: &PathConfig, config: &WebhookConfig) -> Self {
        Self {
            base_host: config
                .base_host
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_ascii_lowercase),
            prefix: paths.webhook_prefix.clone(),
            namespace: config.api_namespace.trim_end_matches('/').to_string(),
        }
    }

    /// True only when a webhook host is configured, the request host equals
    /// it, and the path is under the services prefix.
    pub fn is_webhook_path(&self, host: &str, path: &str) -> bool {
        match &self.base_host {
            Some(base) => base == host && path.starts_with(&self.prefix),
            None => false,
        }
    }

    pub fn forward(&self, request: &IncomingRequest) -> RoutingDecision {
        if request.path().starts_with(&self.prefix) {
            RoutingDecision::rewrite_app(format!(
                "{}{}{}",
                self.namespace,
                request.path(),
                request.search()
            ))
        } else {
            RoutingDecision::NotFound
        }
    }
}

/// One-shot webhook check against config values.
pub fn is_webhook_path(host: &str, path: &str, paths: &PathConfig, config: &WebhookConfig) -> bool {
    WebhookForwarder::from_config(paths, config).is_webhook_path(host, path)
}
