//! Static redirects applied ahead of the router.
//!
//! Rules match on the exact request path and optionally on the host. The
//! app-base-host rule (`/` → dashboard on the app host) is checked first.

use url::Url;

use crate::config::{RedirectConfig, SessionConfig};
use crate::routing::decision::RoutingDecision;
use crate::routing::request::IncomingRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    source: String,
    destination: String,
    permanent: bool,
    host: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StaticRedirects {
    rules: Vec<Rule>,
}

impl StaticRedirects {
    pub fn from_config(config: &RedirectConfig, session: &SessionConfig) -> Self {
        let mut rules = Vec::with_capacity(config.rules.len() + 1);

        if let Some(host) = config.app_base_host.as_deref().filter(|h| !h.is_empty()) {
            rules.push(Rule {
                source: "/".to_string(),
                destination: session.dashboard_path.clone(),
                permanent: false,
                host: Some(host.to_ascii_lowercase()),
            });
        }

        rules.extend(config.rules.iter().map(|r| Rule {
            source: r.source.clone(),
            destination: r.destination.clone(),
            permanent: r.permanent,
            host: r.host.as_ref().map(|h| h.to_ascii_lowercase()),
        }));

        Self { rules }
    }

    /// First matching rule as a redirect, if any.
    pub fn find(&self, request: &IncomingRequest) -> Option<RoutingDecision> {
        let rule = self.rules.iter().find(|rule| {
            rule.source == request.path()
                && rule.host.as_deref().map_or(true, |h| h == request.host())
        })?;

        let location = match Url::parse(&rule.destination) {
            Ok(absolute) => absolute,
            Err(_) => request.url().join(&rule.destination).ok()?,
        };

        Some(RoutingDecision::Redirect {
            location,
            permanent: rule.permanent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedirectRule;

    fn redirects(app_base_host: Option<&str>) -> StaticRedirects {
        let mut config = RedirectConfig {
            app_base_host: app_base_host.map(String::from),
            ..RedirectConfig::default()
        };
        config.rules.push(RedirectRule {
            source: "/view/old-link".into(),
            destination: "/view/new-link".into(),
            permanent: true,
            host: None,
        });
        StaticRedirects::from_config(&config, &SessionConfig::default())
    }

    #[test]
    fn test_settings_goes_to_general() {
        let req = IncomingRequest::new("https", "app.papermark.com", "/settings").unwrap();
        match redirects(None).find(&req) {
            Some(RoutingDecision::Redirect { location, permanent }) => {
                assert_eq!(location.as_str(), "https://app.papermark.com/settings/general");
                assert!(!permanent);
            }
            other => panic!("expected redirect, got {:?}", other),
        }
        let req = IncomingRequest::new("https", "app.papermark.com", "/settings/general").unwrap();
        assert_eq!(redirects(None).find(&req), None);
    }

    #[test]
    fn test_app_base_host_root() {
        let r = redirects(Some("app.papermark.com"));
        assert_eq!(r.rules.len(), 3);

        let req = IncomingRequest::new("https", "app.papermark.com", "/").unwrap();
        match r.find(&req) {
            Some(RoutingDecision::Redirect { location, .. }) => assert_eq!(location.path(), "/dashboard"),
            other => panic!("expected redirect, got {:?}", other),
        }

        let req = IncomingRequest::new("https", "www.papermark.com", "/").unwrap();
        assert_eq!(r.find(&req), None);
    }

    #[test]
    fn test_permanent_rule() {
        let req = IncomingRequest::new("https", "app.papermark.com", "/view/old-link").unwrap();
        match redirects(None).find(&req) {
            Some(RoutingDecision::Redirect { location, permanent }) => {
                assert_eq!(location.path(), "/view/new-link");
                assert!(permanent);
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }
}
