//! Response handling.
//!
//! # Responsibilities
//! - Turn redirect decisions into 307/308 responses
//! - Attach rewrite headers to upstream responses
//! - Map forwarding failures to gateway status codes
//!
//! # Design Decisions
//! - Upstream timeouts become 504, any other upstream failure 502
//! - Headers carried by a decision replace same-named upstream headers

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use url::Url;

use crate::routing::RoutingDecision;

/// Why forwarding a request failed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream target `{0}`")]
    InvalidTarget(String),

    #[error("upstream request failed: {0}")]
    Request(String),

    #[error("upstream timed out")]
    Timeout,
}

impl UpstreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            UpstreamError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            UpstreamError::InvalidTarget(_) => "invalid_target",
            UpstreamError::Request(_) => "request",
            UpstreamError::Timeout => "timeout",
        }
    }
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        let body = match self.status() {
            StatusCode::GATEWAY_TIMEOUT => "Upstream timed out",
            _ => "Upstream request failed",
        };
        (self.status(), body).into_response()
    }
}

pub fn redirect_response(location: &Url, permanent: bool) -> Response {
    let status = StatusCode::from_u16(RoutingDecision::redirect_status(permanent))
        .unwrap_or(StatusCode::TEMPORARY_REDIRECT);
    match HeaderValue::from_str(location.as_str()) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(e) => {
            tracing::error!(location = %location, error = %e, "Redirect target is not a valid header");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Plain 404 used when the not-found page itself cannot be fetched.
pub fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

pub fn apply_extra_headers(headers: &mut HeaderMap, extra: &[(String, String)]) {
    for (name, value) in extra {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid rewrite header"),
        }
    }
}

/// Replace the body-length headers of a rebuffered response.
pub fn rebuffered(status: StatusCode, mut headers: HeaderMap, body: Bytes) -> Response {
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::TRANSFER_ENCODING);
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
