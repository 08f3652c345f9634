//! Custom-domain rewriting.
//!
//! # Responsibilities
//! - Send the bare root of a custom domain to that customer's landing page
//! - Leave internal app routes alone
//! - Refuse blocklisted and static-looking paths
//! - Map everything else into the public viewer namespace
//!
//! # Design Decisions
//! - Landing lookup is an exact host match, with one fallback URL
//! - Rewritten viewer pages are marked noindex

use std::collections::HashMap;

use url::Url;

use crate::config::DomainConfig;
use crate::config::ValidationError;
use crate::routing::decision::{Destination, RoutingDecision};
use crate::routing::path::PathClassifier;
use crate::routing::request::IncomingRequest;

pub const X_ROBOTS_TAG: &str = "X-Robots-Tag";
pub const X_POWERED_BY: &str = "X-Powered-By";

#[derive(Debug, Clone)]
pub struct DomainRewriter {
    landing_pages: HashMap<String, Url>,
    fallback_landing: Url,
    viewer_namespace: String,
    powered_by: String,
}

impl DomainRewriter {
    pub fn from_config(config: &DomainConfig) -> Result<Self, ValidationError> {
        let landing_pages = config
            .landing_pages
            .iter()
            .map(|(host, raw)| {
                parse_url(&format!("domains.landing_pages.{}", host), raw)
                    .map(|url| (host.to_ascii_lowercase(), url))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            landing_pages,
            fallback_landing: parse_url("domains.fallback_landing", &config.fallback_landing)?,
            viewer_namespace: config.viewer_namespace.trim_end_matches('/').to_string(),
            powered_by: config.powered_by.clone(),
        })
    }

    /// Landing page for the root of `host`.
    pub fn landing_for(&self, host: &str) -> &Url {
        self.landing_pages.get(host).unwrap_or(&self.fallback_landing)
    }

    pub fn rewrite(&self, request: &IncomingRequest, paths: &PathClassifier) -> RoutingDecision {
        let path = request.path();

        if path == "/" {
            return RoutingDecision::redirect(self.landing_for(request.host()).clone());
        }

        // App routes win over the blocklist, including dotted ones.
        if paths.is_app_route(path) {
            return RoutingDecision::Continue;
        }

        if paths.is_blocked(path) {
            return RoutingDecision::NotFound;
        }

        RoutingDecision::Rewrite {
            destination: Destination::App {
                path_and_query: format!(
                    "{}/{}{}{}",
                    self.viewer_namespace,
                    request.host(),
                    path,
                    request.search()
                ),
            },
            headers: vec![
                (X_ROBOTS_TAG.to_string(), "noindex".to_string()),
                (X_POWERED_BY.to_string(), self.powered_by.clone()),
            ],
        }
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ValidationError> {
    Url::parse(raw).map_err(|_| ValidationError::InvalidUrl {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathConfig;

    fn setup() -> (DomainRewriter, PathClassifier) {
        (
            DomainRewriter::from_config(&DomainConfig::default()).unwrap(),
            PathClassifier::from_config(&PathConfig::default()),
        )
    }

    #[test]
    fn test_root_redirects_to_partner_landing() {
        let (rw, paths) = setup();
        let req = IncomingRequest::new("https", "fund.tradeair.in", "/").unwrap();
        assert_eq!(
            rw.rewrite(&req, &paths),
            RoutingDecision::redirect(Url::parse("https://tradeair.in/sv-fm-inbound").unwrap())
        );
    }

    #[test]
    fn test_root_falls_back_to_marketing() {
        let (rw, paths) = setup();
        let req = IncomingRequest::new("https", "docs.example-custom.com", "/").unwrap();
        assert_eq!(
            rw.rewrite(&req, &paths),
            RoutingDecision::redirect(Url::parse("https://www.papermark.com/home").unwrap())
        );
    }

    #[test]
    fn test_app_routes_pass_through() {
        let (rw, paths) = setup();
        let req = IncomingRequest::new("https", "docs.example-custom.com", "/login?next=x").unwrap();
        assert_eq!(rw.rewrite(&req, &paths), RoutingDecision::Continue);
    }

    #[test]
    fn test_dotted_and_blocked_paths_are_not_found() {
        let (rw, paths) = setup();
        for path in ["/report.pdf", "/wp-admin", "/abc/.env"] {
            let req = IncomingRequest::new("https", "docs.example-custom.com", path).unwrap();
            assert_eq!(rw.rewrite(&req, &paths), RoutingDecision::NotFound, "{}", path);
        }
    }

    #[test]
    fn test_dotted_app_route_passes_through() {
        let (rw, paths) = setup();
        let req = IncomingRequest::new("https", "docs.example-custom.com", "/dashboard.json").unwrap();
        assert_eq!(rw.rewrite(&req, &paths), RoutingDecision::Continue);
    }

    #[test]
    fn test_dotted_services_path_is_not_found() {
        let (rw, paths) = setup();
        let req = IncomingRequest::new("https", "docs.example-custom.com", "/services/report.pdf").unwrap();
        assert_eq!(rw.rewrite(&req, &paths), RoutingDecision::NotFound);
    }

    #[test]
    fn test_rewrite_into_viewer_namespace() {
        let (rw, paths) = setup();
        let req = IncomingRequest::new("https", "docs.example-custom.com", "/abc123?email=a%40b.com").unwrap();
        match rw.rewrite(&req, &paths) {
            RoutingDecision::Rewrite { destination, headers } => {
                assert_eq!(
                    destination,
                    Destination::App {
                        path_and_query: "/view/domains/docs.example-custom.com/abc123?email=a%40b.com".into()
                    }
                );
                assert!(headers.contains(&("X-Robots-Tag".into(), "noindex".into())));
                assert!(headers.iter().any(|(k, v)| k == "X-Powered-By" && v.starts_with("Papermark.io")));
            }
            other => panic!("expected rewrite, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_landing_is_rejected() {
        let mut config = DomainConfig::default();
        config.fallback_landing = "nope".into();
        assert!(DomainRewriter::from_config(&config).is_err());
    }
}
