//! Admin API.
//!
//! Read-only introspection served on its own listener: status, the active
//! (redacted) configuration, route explanations and the queue table. Every
//! endpoint sits behind the bearer key check.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;
use crate::lifecycle::shutdown;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/config", get(get_config))
        .route("/admin/route", get(get_route))
        .route("/admin/queues", get(get_queues))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(shutdown::wait(shutdown))
        .await
}
