//! Routing decision types.
//!
//! Final output of the dispatcher, consumed by the HTTP boundary adapter.

use serde::Serialize;
use url::Url;

/// What to do with one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// Forward to the application unchanged.
    Continue,

    /// Tell the client to request another URL.
    Redirect { location: Url, permanent: bool },

    /// Serve other content for the same client-visible URL.
    Rewrite {
        destination: Destination,
        /// Extra headers set on the response.
        headers: Vec<(String, String)>,
    },

    /// Serve the not-found page with a 404 status.
    NotFound,
}

/// Where a rewrite is served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum Destination {
    /// A path (with query) on the upstream application.
    App { path_and_query: String },
    /// An absolute URL on a third-party host.
    External { url: Url },
}

impl RoutingDecision {
    pub fn redirect(location: Url) -> Self {
        RoutingDecision::Redirect {
            location,
            permanent: false,
        }
    }

    pub fn rewrite_app(path_and_query: impl Into<String>) -> Self {
        RoutingDecision::Rewrite {
            destination: Destination::App {
                path_and_query: path_and_query.into(),
            },
            headers: Vec::new(),
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingDecision::Continue => "continue",
            RoutingDecision::Redirect { .. } => "redirect",
            RoutingDecision::Rewrite { .. } => "rewrite",
            RoutingDecision::NotFound => "not_found",
        }
    }

    /// Redirect status: 308 when permanent, 307 otherwise.
    pub fn redirect_status(permanent: bool) -> u16 {
        if permanent {
            308
        } else {
            307
        }
    }
}

/// Which handler produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Analytics,
    StaticRedirect,
    Excluded,
    Webhook,
    CustomDomain,
    App,
    PublicViewer,
    Passthrough,
}

impl Branch {
    pub fn as_str(self) -> &'static str {
        match self {
            Branch::Analytics => "analytics",
            Branch::StaticRedirect => "static_redirect",
            Branch::Excluded => "excluded",
            Branch::Webhook => "webhook",
            Branch::CustomDomain => "custom_domain",
            Branch::App => "app",
            Branch::PublicViewer => "public_viewer",
            Branch::Passthrough => "passthrough",
        }
    }
}

/// A decision together with the branch that made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Routed {
    pub branch: Branch,
    pub decision: RoutingDecision,
}
