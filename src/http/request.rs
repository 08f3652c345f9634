//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible
//! - Extract routing-relevant information (host, path, query, cookies)
//!
//! # Design Decisions
//! - An incoming `x-request-id` is kept, so ids survive upstream hops
//! - `Host` header first, URI authority second (HTTP/2 requests)

use axum::http::{header, request::Parts, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::IncomingRequest;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request id of a request, or `"unknown"`.
pub fn request_id(parts: &Parts) -> &str {
    parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Host as the client addressed it.
pub fn request_host(parts: &Parts) -> String {
    parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

/// Build the router's view of a request.
pub fn incoming_request(parts: &Parts, scheme: &str) -> Result<IncomingRequest, url::ParseError> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let cookies = parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");

    Ok(IncomingRequest::new(scheme, &request_host(parts), path_and_query)?.with_cookie_header(&cookies))
}
