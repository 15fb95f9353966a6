//! Request correlation and write protection.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of the current request, readable from request extensions.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Reuse the caller's `x-request-id` or mint one, and echo it on the response.
pub async fn inject_request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("mkt-{}", hex::encode(rand::random::<[u8; 8]>())));

    request.extensions_mut().insert(RequestId(id.clone()));
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Flows and wallet connection need the configured key; reads are public.
/// With no key configured every request passes (dev mode).
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_key.as_deref().filter(|k| !k.is_empty()) else {
        return next.run(request).await;
    };
    if request.method() == Method::GET {
        return next.run(request).await;
    }

    let accepted = presented_key(request.headers())
        .is_some_and(|key| key.len() == expected.len() && bool::from(key.as_bytes().ct_eq(expected.as_bytes())));
    if !accepted {
        debug!(path = %request.uri().path(), "Rejected request without valid API key");
        return crate::Error::Unauthorized("invalid or missing API key".into()).into_response();
    }
    next.run(request).await
}

/// `X-Api-Key`, or the token of `Authorization: Bearer`.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key);
    }
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
