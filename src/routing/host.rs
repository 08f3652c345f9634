//! Host classification.
//!
//! # Responsibilities
//! - Decide whether a `Host` header belongs to the application itself
//!   or to a customer-owned custom domain
//!
//! # Design Decisions
//! - Allow-list wins: anything not recognised as own-domain is a custom domain
//! - Development mode is a config field, never read from the environment here
//! - Substring and suffix checks only, no regex

use serde::Serialize;
use url::Url;

use crate::config::{HostConfig, Mode};

/// Classification of a request host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKind {
    OwnDomain,
    CustomDomain,
}

/// Compiled host policy.
#[derive(Debug, Clone)]
pub struct HostClassifier {
    mode: Mode,
    app_domains: Vec<String>,
    platform_suffixes: Vec<String>,
    /// Exact hostnames taken from the configured base URLs.
    own_hosts: Vec<String>,
    development_custom_domains: Vec<String>,
}

impl HostClassifier {
    pub fn from_config(mode: Mode, config: &HostConfig) -> Self {
        let own_hosts = [&config.auth_url, &config.base_url]
            .into_iter()
            .flatten()
            .filter_map(|raw| Url::parse(raw).ok())
            .filter_map(|url| url.host_str().map(str::to_ascii_lowercase))
            .collect();

        Self {
            mode,
            app_domains: lowercase(&config.app_domains),
            platform_suffixes: lowercase(&config.platform_suffixes),
            own_hosts,
            development_custom_domains: lowercase(&config.development_custom_domains),
        }
    }

    pub fn classify(&self, host: &str) -> HostKind {
        let host = host.trim().to_ascii_lowercase();
        if host.is_empty() {
            return HostKind::CustomDomain;
        }

        if self.mode.is_development() {
            let custom = self
                .development_custom_domains
                .iter()
                .any(|d| host.contains(d.as_str()));
            return if custom {
                HostKind::CustomDomain
            } else {
                HostKind::OwnDomain
            };
        }

        let own = host.contains("localhost")
            || self.app_domains.iter().any(|d| host.contains(d.as_str()))
            || self.platform_suffixes.iter().any(|s| host.ends_with(s.as_str()))
            || self.own_hosts.iter().any(|h| *h == host);

        if own {
            HostKind::OwnDomain
        } else {
            HostKind::CustomDomain
        }
    }

    pub fn is_custom_domain(&self, host: &str) -> bool {
        self.classify(host) == HostKind::CustomDomain
    }
}

/// One-shot classification against a config value.
pub fn classify_host(host: &str, mode: Mode, config: &HostConfig) -> HostKind {
    HostClassifier::from_config(mode, config).classify(host)
}

fn lowercase(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_ascii_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn production() -> HostClassifier {
        let config = HostConfig {
            auth_url: Some("https://docs.acme-hosting.net".into()),
            base_url: Some("https://share.acme-hosting.net:8443/path".into()),
            ..HostConfig::default()
        };
        HostClassifier::from_config(Mode::Production, &config)
    }

    #[test]
    fn test_own_domains() {
        let classifier = production();
        for host in [
            "localhost:3000",
            "app.papermark.com",
            "www.papermark.io",
            "papermark-git-feature.vercel.app",
            "docs.acme-hosting.net",
            "share.acme-hosting.net",
            "APP.PAPERMARK.COM",
        ] {
            assert_eq!(classifier.classify(host), HostKind::OwnDomain, "{}", host);
        }
    }

    #[test]
    fn test_custom_domains() {
        let classifier = production();
        for host in [
            "docs.example-custom.com",
            "vercel.app.example.org",
            "acme-hosting.net",
            "other.acme-hosting.net",
            "",
        ] {
            assert_eq!(classifier.classify(host), HostKind::CustomDomain, "{:?}", host);
        }
    }

    #[test]
    fn test_base_url_match_is_exact() {
        // The configured hostname matches only without a port.
        assert!(production().is_custom_domain("share.acme-hosting.net:8443"));
    }

    #[test]
    fn test_development_inverts_policy() {
        let classifier = HostClassifier::from_config(Mode::Development, &HostConfig::default());
        assert_eq!(classifier.classify("docs.customer.local"), HostKind::CustomDomain);
        assert_eq!(classifier.classify("demo.papermark.dev"), HostKind::CustomDomain);
        assert_eq!(classifier.classify("localhost:3000"), HostKind::OwnDomain);
        assert_eq!(classifier.classify("docs.example-custom.com"), HostKind::OwnDomain);
        assert_eq!(classifier.classify(""), HostKind::CustomDomain);
    }

    #[test]
    fn test_classify_host_helper() {
        assert_eq!(
            classify_host("app.papermark.io", Mode::Production, &HostConfig::default()),
            HostKind::OwnDomain
        );
    }
}
