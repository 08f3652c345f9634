use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{EdgeConfig, Mode};
use crate::http::server::AppState;
use crate::jobs::{queue_for_plan, queue_name_for_plan, ConversionQueue, QUEUES};
use crate::routing::{IncomingRequest, Routed};
use crate::session::decode_with_timeout;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub mode: Mode,
    pub passkey_enabled: bool,
    pub passkey_tenant: Option<String>,
    pub passkey_tenant_url: Option<String>,
}

#[derive(Deserialize)]
pub struct RouteQuery {
    pub host: String,
    pub path: String,
    /// Raw session token, as it would arrive in the cookie.
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct RouteExplanation {
    #[serde(flatten)]
    pub routed: Routed,
    pub authenticated: bool,
}

#[derive(Deserialize)]
pub struct QueueQuery {
    pub plan: Option<String>,
}

#[derive(Serialize)]
pub struct PlanQueue {
    pub plan: String,
    pub queue: ConversionQueue,
    pub derived_name: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let runtime = state.runtime.load();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        mode: runtime.config.mode,
        passkey_enabled: runtime.passkey.is_some(),
        passkey_tenant: runtime.passkey.as_ref().map(|p| p.tenant_id().to_string()),
        passkey_tenant_url: runtime.passkey.as_ref().map(|p| p.tenant_url().to_string()),
    })
}

pub async fn get_config(State(state): State<AppState>) -> Json<EdgeConfig> {
    Json(state.runtime.load().config.redacted())
}

/// Explain how a request would be routed right now.
pub async fn get_route(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RouteExplanation>, (StatusCode, String)> {
    let runtime = state.runtime.load_full();
    let path = if query.path.starts_with('/') {
        query.path
    } else {
        format!("/{}", query.path)
    };

    if query.host.contains(['/', '?', '#', ' ']) {
        return Err((StatusCode::BAD_REQUEST, format!("invalid host `{}`", query.host)));
    }
    let request = IncomingRequest::new(&runtime.config.listener.public_scheme, &query.host, &path)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let timeout = std::time::Duration::from_millis(runtime.config.timeouts.session_decode_ms);
    let session = match query.token.filter(|t| !t.is_empty()) {
        Some(raw) => decode_with_timeout(runtime.decoder.clone(), raw, timeout).await.ok(),
        None => None,
    };

    let routed = runtime.dispatcher.route(&request, session.as_ref(), Utc::now());
    Ok(Json(RouteExplanation {
        routed,
        authenticated: session.as_ref().is_some_and(|s| s.is_authenticated()),
    }))
}

pub async fn get_queues(Query(query): Query<QueueQuery>) -> Json<serde_json::Value> {
    match query.plan {
        Some(plan) => Json(serde_json::json!(PlanQueue {
            queue: queue_for_plan(&plan),
            derived_name: queue_name_for_plan(&plan),
            plan,
        })),
        None => Json(serde_json::json!(QUEUES)),
    }
}
