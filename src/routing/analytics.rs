//! Analytics ingestion forwarding.
//!
//! Browser analytics are posted to our own origin under the ingestion prefix
//! and rewritten to the capture provider, so ad blockers keyed on the
//! provider's hostname never see them.

use url::Url;

use crate::config::{AnalyticsConfig, PathConfig};
use crate::routing::decision::{Destination, RoutingDecision};
use crate::routing::request::IncomingRequest;

const STATIC_SEGMENT: &str = "/static/";

#[derive(Debug, Clone)]
pub struct AnalyticsForwarder {
    /// Ingestion prefix without its trailing slash, e.g. `/ingest`.
    prefix: String,
    api_host: String,
    assets_host: String,
}

impl AnalyticsForwarder {
    pub fn from_config(paths: &PathConfig, config: &AnalyticsConfig) -> Self {
        Self {
            prefix: paths.analytics_prefix.trim_end_matches('/').to_string(),
            api_host: config.api_host.clone(),
            assets_host: config.assets_host.clone(),
        }
    }

    pub fn forward(&self, request: &IncomingRequest) -> RoutingDecision {
        let rest = request
            .path()
            .strip_prefix(self.prefix.as_str())
            .unwrap_or_else(|| request.path());
        let rest = if rest.is_empty() { "/" } else { rest };

        let host = if rest.starts_with(STATIC_SEGMENT) {
            &self.assets_host
        } else {
            &self.api_host
        };

        match Url::parse(&format!("https://{}{}{}", host, rest, request.search())) {
            Ok(url) => RoutingDecision::Rewrite {
                destination: Destination::External { url },
                headers: Vec::new(),
            },
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Analytics target is not a valid URL");
                RoutingDecision::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forwarder() -> AnalyticsForwarder {
        AnalyticsForwarder::from_config(&PathConfig::default(), &AnalyticsConfig::default())
    }

    fn external(decision: RoutingDecision) -> Url {
        match decision {
            RoutingDecision::Rewrite {
                destination: Destination::External { url },
                ..
            } => url,
            other => panic!("expected external rewrite, got {:?}", other),
        }
    }

    #[test]
    fn test_events_go_to_api_host() {
        let req = IncomingRequest::new("https", "app.papermark.com", "/ingest/e/?ip=1&ver=1.2").unwrap();
        let url = external(forwarder().forward(&req));
        assert_eq!(url.as_str(), "https://eu.i.posthog.com/e/?ip=1&ver=1.2");
    }

    #[test]
    fn test_static_goes_to_assets_host() {
        let req = IncomingRequest::new("https", "docs.customer.com", "/ingest/static/array.js").unwrap();
        let url = external(forwarder().forward(&req));
        assert_eq!(url.as_str(), "https://eu-assets.i.posthog.com/static/array.js");
    }
}
