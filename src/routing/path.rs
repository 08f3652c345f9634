//! Path classification.
//!
//! # Responsibilities
//! - Recognise analytics ingestion, webhook and public-viewer namespaces
//! - Recognise app route roots and paths the router never handles
//! - Refuse blocklisted pathnames and anything that looks like a static file
//!
//! # Design Decisions
//! - Priority order is fixed: analytics beats everything
//! - A literal `.` anywhere in the path counts as a static-file request
//! - Prefix and exact matches only

use serde::Serialize;

use crate::config::PathConfig;

/// Classification of a request path, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    Analytics,
    /// Never routed: framework internals, API routes, well-known files.
    Excluded,
    WebhookCandidate,
    Blocked,
    AppRoute,
    ViewRoute,
    Other,
}

/// Compiled path policy.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    analytics_prefix: String,
    webhook_prefix: String,
    view_prefix: String,
    public_prefixes: Vec<String>,
    app_routes: Vec<String>,
    blocked_pathnames: Vec<String>,
    excluded_prefixes: Vec<String>,
}

impl PathClassifier {
    pub fn from_config(config: &PathConfig) -> Self {
        Self {
            analytics_prefix: config.analytics_prefix.clone(),
            webhook_prefix: config.webhook_prefix.clone(),
            view_prefix: config.view_prefix.clone(),
            public_prefixes: config.public_prefixes.clone(),
            app_routes: config.app_routes.clone(),
            blocked_pathnames: config.blocked_pathnames.clone(),
            excluded_prefixes: config.excluded_prefixes.clone(),
        }
    }

    pub fn classify(&self, path: &str) -> PathKind {
        if self.is_analytics(path) {
            PathKind::Analytics
        } else if self.is_excluded(path) {
            PathKind::Excluded
        } else if self.is_webhook_candidate(path) {
            PathKind::WebhookCandidate
        } else if self.is_app_route(path) {
            PathKind::AppRoute
        } else if self.is_blocked(path) {
            PathKind::Blocked
        } else if self.is_view_route(path) {
            PathKind::ViewRoute
        } else {
            PathKind::Other
        }
    }

    pub fn is_analytics(&self, path: &str) -> bool {
        path.starts_with(&self.analytics_prefix)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    pub fn is_webhook_candidate(&self, path: &str) -> bool {
        path.starts_with(&self.webhook_prefix)
    }

    /// Exact blocklist membership, or a dot anywhere in the path.
    pub fn is_blocked(&self, path: &str) -> bool {
        path.contains('.') || self.blocked_pathnames.iter().any(|b| b == path)
    }

    /// Looser check used inside the viewer namespace: a blocked pathname
    /// appearing anywhere in the path, or a dot.
    pub fn contains_blocked(&self, path: &str) -> bool {
        path.contains('.') || self.blocked_pathnames.iter().any(|b| path.contains(b.as_str()))
    }

    pub fn is_app_route(&self, path: &str) -> bool {
        self.app_routes.iter().any(|r| path.starts_with(r.as_str()))
    }

    pub fn is_view_route(&self, path: &str) -> bool {
        path.starts_with(&self.view_prefix)
    }

    /// Paths served on own domains without going through authentication.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// One-shot classification against a config value.
pub fn classify_path(path: &str, config: &PathConfig) -> PathKind {
    PathClassifier::from_config(config).classify(path)
}
