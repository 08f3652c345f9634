//! Top-level request dispatch.
//!
//! # Algorithm
//! ```text
//! analytics path                          → analytics forwarder
//! static redirect rule matches            → redirect
//! excluded path                           → continue
//! webhook host + services path            → webhook forwarder
//! custom domain                           → custom-domain rewriter
//! not a public namespace                  → authenticated app handler
//! viewer path, blocked or dotted          → not found
//! otherwise                               → continue
//! ```
//!
//! # Design Decisions
//! - Pure: the same request, session and clock always give the same decision
//! - Compiled once from config; a reload builds a new Dispatcher
//! - Session decoding happens before dispatch so no I/O runs in here

use chrono::{DateTime, Utc};

use crate::config::{ConfigError, EdgeConfig};
use crate::config::validation::validate_config;
use crate::routing::analytics::AnalyticsForwarder;
use crate::routing::app::AppHandler;
use crate::routing::decision::{Branch, Routed, RoutingDecision};
use crate::routing::domain::DomainRewriter;
use crate::routing::host::{HostClassifier, HostKind};
use crate::routing::path::PathClassifier;
use crate::routing::redirects::StaticRedirects;
use crate::routing::request::IncomingRequest;
use crate::routing::webhook::WebhookForwarder;
use crate::session::SessionToken;

/// Immutable, compiled router.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    hosts: HostClassifier,
    paths: PathClassifier,
    redirects: StaticRedirects,
    analytics: AnalyticsForwarder,
    webhooks: WebhookForwarder,
    domains: DomainRewriter,
    app: AppHandler,
}

impl Dispatcher {
    /// Validate `config` and compile it.
    pub fn from_config(config: &EdgeConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let domains = DomainRewriter::from_config(&config.domains)
            .map_err(|e| ConfigError::Validation(vec![e]))?;

        Ok(Self {
            hosts: HostClassifier::from_config(config.mode, &config.hosts),
            paths: PathClassifier::from_config(&config.paths),
            redirects: StaticRedirects::from_config(&config.redirects, &config.session),
            analytics: AnalyticsForwarder::from_config(&config.paths, &config.analytics),
            webhooks: WebhookForwarder::from_config(&config.paths, &config.webhooks),
            domains,
            app: AppHandler::from_config(&config.session),
        })
    }

    /// Decide what to do with `request`.
    pub fn dispatch(
        &self,
        request: &IncomingRequest,
        session: Option<&SessionToken>,
        now: DateTime<Utc>,
    ) -> RoutingDecision {
        self.route(request, session, now).decision
    }

    /// Like [`Dispatcher::dispatch`], also reporting which branch decided.
    pub fn route(
        &self,
        request: &IncomingRequest,
        session: Option<&SessionToken>,
        now: DateTime<Utc>,
    ) -> Routed {
        let host = request.host();
        let path = request.path();

        if self.paths.is_analytics(path) {
            return routed(Branch::Analytics, self.analytics.forward(request));
        }

        if let Some(redirect) = self.redirects.find(request) {
            return routed(Branch::StaticRedirect, redirect);
        }

        if self.paths.is_excluded(path) {
            return routed(Branch::Excluded, RoutingDecision::Continue);
        }

        if self.webhooks.is_webhook_path(host, path) {
            return routed(Branch::Webhook, self.webhooks.forward(request));
        }

        if self.hosts.classify(host) == HostKind::CustomDomain {
            return routed(Branch::CustomDomain, self.domains.rewrite(request, &self.paths));
        }

        if !self.paths.is_public(path) {
            return routed(Branch::App, self.app.handle(request, session, now));
        }

        if self.paths.is_view_route(path) && self.paths.contains_blocked(path) {
            return routed(Branch::PublicViewer, RoutingDecision::NotFound);
        }

        routed(Branch::Passthrough, RoutingDecision::Continue)
    }
}

fn routed(branch: Branch, decision: RoutingDecision) -> Routed {
    Routed { branch, decision }
}
