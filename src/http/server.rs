//! HTTP server setup and the routing boundary adapter.
//!
//! # Responsibilities
//! - Create the Axum Router with the catch-all edge handler
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Decode the session cookie when the decision depends on it
//! - Translate routing decisions into responses
//! - Forward continued and rewritten requests upstream
//! - Swap in reloaded configuration atomically

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, request::Parts, HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use chrono::Utc;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::{ConfigError, EdgeConfig};
use crate::http::request::{incoming_request, request_id, MakeRequestUuidV4};
use crate::http::response::{
    apply_extra_headers, not_found_response, rebuffered, redirect_response, UpstreamError,
};
use crate::integrations::PasskeyTenant;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::{Branch, Destination, Dispatcher, IncomingRequest, Routed, RoutingDecision};
use crate::security::{strip_hop_by_hop, SecurityHeaders};
use crate::session::{decode_with_timeout, JwtSessionDecoder, SessionDecoder, SessionError, SessionToken};

/// Largest request body buffered for external rewrites.
const MAX_EXTERNAL_BODY: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("session decoder: {0}")]
    Session(#[from] SessionError),

    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything compiled from one configuration.
pub struct EdgeRuntime {
    pub config: EdgeConfig,
    pub dispatcher: Dispatcher,
    pub decoder: Arc<dyn SessionDecoder>,
    pub security: SecurityHeaders,
    pub passkey: Option<PasskeyTenant>,
}

impl EdgeRuntime {
    pub fn from_config(config: EdgeConfig) -> Result<Self, ServerError> {
        let dispatcher = Dispatcher::from_config(&config)?;
        let decoder: Arc<dyn SessionDecoder> = Arc::new(JwtSessionDecoder::from_config(&config.session)?);
        if config.session.secret.is_empty() {
            tracing::warn!("No session secret configured; every visitor is treated as signed out");
        }

        let passkey = match PasskeyTenant::from_config(&config.passkey) {
            Ok(tenant) => Some(tenant),
            Err(e) => {
                tracing::warn!(error = %e, "Passkeys disabled");
                None
            }
        };

        Ok(Self {
            security: SecurityHeaders::from_config(&config.security, config.mode),
            dispatcher,
            decoder,
            passkey,
            config,
        })
    }

    fn decode_timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeouts.session_decode_ms)
    }

    fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeouts.upstream_secs)
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ArcSwap<EdgeRuntime>>,
    pub client: Client<HttpConnector, Body>,
    pub external: reqwest::Client,
    decoder_override: Option<Arc<dyn SessionDecoder>>,
}

impl AppState {
    pub fn new(config: EdgeConfig) -> Result<Self, ServerError> {
        let runtime = EdgeRuntime::from_config(config)?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let external = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            runtime: Arc::new(ArcSwap::from_pointee(runtime)),
            client,
            external,
            decoder_override: None,
        })
    }

    /// Replace the session decoder, surviving reloads.
    pub fn with_decoder(mut self, decoder: Arc<dyn SessionDecoder>) -> Self {
        let current = self.runtime.load_full();
        self.runtime.store(Arc::new(EdgeRuntime {
            config: current.config.clone(),
            dispatcher: current.dispatcher.clone(),
            decoder: decoder.clone(),
            security: current.security.clone(),
            passkey: current.passkey.clone(),
        }));
        self.decoder_override = Some(decoder);
        self
    }

    /// Compile `config` and swap it in. The old runtime stays on error.
    pub fn reload(&self, config: EdgeConfig) -> Result<(), ServerError> {
        let previous = self.runtime.load();
        if previous.config.listener.bind_address != config.listener.bind_address {
            tracing::warn!("listener.bind_address changes need a restart; keeping the current socket");
        }

        let mut runtime = EdgeRuntime::from_config(config)?;
        if let Some(decoder) = &self.decoder_override {
            runtime.decoder = decoder.clone();
        }
        self.runtime.store(Arc::new(runtime));
        tracing::info!("Configuration reloaded");
        Ok(())
    }
}

/// HTTP server for the edge router.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: EdgeConfig) -> Result<Self, ServerError> {
        Ok(Self::from_state(AppState::new(config)?))
    }

    pub fn from_state(state: AppState) -> Self {
        let request_secs = state.runtime.load().config.timeouts.request_secs;
        let router = Self::build_router(request_secs, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(request_secs: u64, state: AppState) -> Router {
        Router::new()
            .route("/", any(edge_handler))
            .route("/{*path}", any(edge_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(request_secs))),
            )
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Serve on `listener` until `shutdown` fires. With `config_updates`, each
    /// received config is applied as it arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: Option<mpsc::UnboundedReceiver<EdgeConfig>>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Edge server starting");

        if let Some(mut updates) = config_updates {
            let state = self.state.clone();
            tokio::spawn(async move {
                while let Some(config) = updates.recv().await {
                    if let Err(e) = state.reload(config) {
                        tracing::error!(error = %e, "Rejected configuration update");
                    }
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("Edge server stopped");
        Ok(())
    }
}

/// Catch-all handler: decide, then carry the decision out.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let runtime = state.runtime.load_full();
    let (parts, body) = request.into_parts();
    let incoming = match incoming_request(&parts, &runtime.config.listener.public_scheme) {
        Ok(incoming) => incoming,
        Err(e) => {
            tracing::warn!(request_id = %request_id(&parts), error = %e, "Request URL cannot be rebuilt");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let routed = route(&runtime, &incoming).await;
    metrics::record_decision(&routed);
    tracing::debug!(
        request_id = %request_id(&parts),
        host = %incoming.host(),
        path = %incoming.path(),
        branch = routed.branch.as_str(),
        decision = routed.decision.kind(),
        "Routed request"
    );

    let not_found_path = runtime.config.paths.not_found_path.clone();
    let (mut response, served_path) = match routed.decision {
        RoutingDecision::Continue => {
            let target = incoming.path_and_query();
            let response = forward_app(&state, &runtime, &parts, body, &incoming, &target)
                .await
                .unwrap_or_else(IntoResponse::into_response);
            (response, incoming.path().to_string())
        }
        RoutingDecision::Redirect { location, permanent } => {
            (redirect_response(&location, permanent), incoming.path().to_string())
        }
        RoutingDecision::Rewrite {
            destination: Destination::App { path_and_query },
            headers,
        } => {
            let mut response = forward_app(&state, &runtime, &parts, body, &incoming, &path_and_query)
                .await
                .unwrap_or_else(IntoResponse::into_response);
            apply_extra_headers(response.headers_mut(), &headers);
            let served = path_and_query.split('?').next().unwrap_or_default().to_string();
            (response, served)
        }
        RoutingDecision::Rewrite {
            destination: Destination::External { url },
            headers,
        } => {
            let mut response = forward_external(&state, &runtime, &parts, body, &url)
                .await
                .unwrap_or_else(IntoResponse::into_response);
            apply_extra_headers(response.headers_mut(), &headers);
            (response, url.path().to_string())
        }
        RoutingDecision::NotFound => {
            let response = match forward_app(&state, &runtime, &parts, body, &incoming, &not_found_path).await {
                Ok(mut response) => {
                    *response.status_mut() = StatusCode::NOT_FOUND;
                    response
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Not-found page unavailable, answering directly");
                    not_found_response()
                }
            };
            (response, not_found_path)
        }
    };

    runtime.security.apply(incoming.path(), &served_path, response.headers_mut());
    response
}

/// Route once without a session; only the app branch reads one, so the
/// cookie is decoded only when that branch is taken.
async fn route(runtime: &EdgeRuntime, incoming: &IncomingRequest) -> Routed {
    let now = Utc::now();
    let routed = runtime.dispatcher.route(incoming, None, now);
    if routed.branch != Branch::App {
        return routed;
    }

    match resolve_session(runtime, incoming).await {
        Some(session) => runtime.dispatcher.route(incoming, Some(&session), now),
        None => routed,
    }
}

async fn resolve_session(runtime: &EdgeRuntime, incoming: &IncomingRequest) -> Option<SessionToken> {
    let Some(raw) = incoming.chunked_cookie(&runtime.config.session.cookie_name) else {
        metrics::record_session_decode("absent");
        return None;
    };

    match decode_with_timeout(runtime.decoder.clone(), raw, runtime.decode_timeout()).await {
        Ok(session) => {
            metrics::record_session_decode("ok");
            Some(session)
        }
        Err(e) => {
            metrics::record_session_decode(e.outcome());
            if matches!(e, SessionError::Timeout(_)) {
                tracing::warn!(error = %e, "Session decoding timed out; treating as signed out");
            } else {
                tracing::debug!(error = %e, "Session cookie rejected");
            }
            None
        }
    }
}

/// Forward to the upstream application at `path_and_query`.
async fn forward_app(
    state: &AppState,
    runtime: &EdgeRuntime,
    parts: &Parts,
    body: Body,
    incoming: &IncomingRequest,
    path_and_query: &str,
) -> Result<Response, UpstreamError> {
    let target = format!("http://{}{}", runtime.config.upstream.app_address, path_and_query);
    let uri: Uri = target
        .parse()
        .map_err(|_| UpstreamError::InvalidTarget(target.clone()))?;

    let mut headers = parts.headers.clone();
    strip_hop_by_hop(&mut headers);
    if let Ok(host) = HeaderValue::from_str(incoming.host()) {
        headers.insert("x-forwarded-host", host);
    }
    if let Ok(proto) = HeaderValue::from_str(&runtime.config.listener.public_scheme) {
        headers.insert("x-forwarded-proto", proto);
    }

    let mut request = Request::new(body);
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;

    let start = Instant::now();
    let result = tokio::time::timeout(runtime.upstream_timeout(), state.client.request(request)).await;
    match result {
        Ok(Ok(response)) => {
            metrics::record_upstream("app", response.status().as_u16(), start);
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Ok(Response::from_parts(parts, Body::new(body)))
        }
        Ok(Err(e)) => {
            let err = UpstreamError::Request(e.to_string());
            metrics::record_upstream_error("app", err.reason());
            tracing::error!(request_id = %request_id(parts), target = %target, error = %e, "Upstream error");
            Err(err)
        }
        Err(_) => {
            metrics::record_upstream_error("app", UpstreamError::Timeout.reason());
            tracing::error!(request_id = %request_id(parts), target = %target, "Upstream timed out");
            Err(UpstreamError::Timeout)
        }
    }
}

/// Forward to a third-party host, buffering both bodies.
async fn forward_external(
    state: &AppState,
    runtime: &EdgeRuntime,
    parts: &Parts,
    body: Body,
    url: &Url,
) -> Result<Response, UpstreamError> {
    let bytes = axum::body::to_bytes(body, MAX_EXTERNAL_BODY)
        .await
        .map_err(|e| UpstreamError::Request(e.to_string()))?;

    let mut headers = parts.headers.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::COOKIE);

    let start = Instant::now();
    let result = state
        .external
        .request(parts.method.clone(), url.clone())
        .headers(headers)
        .body(bytes)
        .timeout(runtime.upstream_timeout())
        .send()
        .await;

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            let err = if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Request(e.to_string())
            };
            metrics::record_upstream_error("external", err.reason());
            tracing::warn!(request_id = %request_id(parts), url = %url, error = %e, "External rewrite failed");
            return Err(err);
        }
    };

    let status = response.status();
    let mut headers = response.headers().clone();
    strip_hop_by_hop(&mut headers);
    let body = response
        .bytes()
        .await
        .map_err(|e| UpstreamError::Request(e.to_string()))?;
    metrics::record_upstream("external", status.as_u16(), start);

    Ok(rebuffered(status, headers, body))
}
