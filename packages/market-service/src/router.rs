//! HTTP router setup.

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Wallet prompts are serial on the user's side; cap in-flight requests.
const MAX_IN_FLIGHT: usize = 64;

/// Create the application router.
pub fn create(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/wallet/connect", post(handlers::connect))
        .route("/wallet/assets", get(handlers::wallet_assets))
        .route("/offers", get(handlers::offers).post(handlers::list))
        .route("/offers/seller/{address}", get(handlers::seller_offers))
        .route("/offers/{index}/cancel", post(handlers::cancel))
        .route("/offers/{index}/buy", post(handlers::buy))
        .route("/mint", post(handlers::mint))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ))
        .layer(axum::middleware::from_fn(middleware::inject_request_id))
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
