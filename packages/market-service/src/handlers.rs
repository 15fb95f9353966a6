//! HTTP request handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Extension;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use crate::metrics::METRICS;
use crate::middleware::RequestId;
use crate::offer_store::IndexedOffer;
use crate::response::{FlowResponse, HealthResponse};
use crate::state::AppState;
use crate::wallet::EnableOptions;
use crate::workflow::{ListRequest, MintRequest, WalletAsset};

/// Health check with store and wallet status.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let offers = state.market.store().len();
    let wallet_connected = state.wallet_connected().await;
    let status = match (&offers, wallet_connected) {
        (Err(_), _) => "unavailable",
        (Ok(_), false) => "degraded",
        (Ok(_), true) => "ok",
    };
    Json(HealthResponse {
        status,
        wallet_connected,
        contract_address: state.config.contract_address.clone(),
        offers: offers.unwrap_or(0),
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
    })
}

/// Prometheus metrics in text exposition format.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let offers = state.market.store().len().unwrap_or(0);
    let body = METRICS.render(offers, state.wallet_connected().await);
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        body,
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub request_identification: bool,
}

/// Ask the wallet for access (prompts the user).
pub async fn connect(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, crate::Error> {
    let request: ConnectRequest = if body.is_empty() {
        ConnectRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| crate::Error::InvalidInput(format!("connect body: {e}")))?
    };
    state
        .connect(EnableOptions {
            request_identification: request.request_identification,
            only_silent: false,
        })
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Native assets in the connected wallet.
pub async fn wallet_assets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WalletAsset>>, crate::Error> {
    let wallet = state.wallet().await?;
    Ok(Json(state.market.wallet_assets(wallet.as_ref()).await?))
}

/// Every listing, with its position.
pub async fn offers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IndexedOffer>>, crate::Error> {
    Ok(Json(state.market.store().indexed()?))
}

/// Listings by one seller, with their positions in the full store.
pub async fn seller_offers(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<Vec<IndexedOffer>>, crate::Error> {
    let offers = state
        .market
        .store()
        .filter_by_seller(&address)?
        .into_iter()
        .map(|(offer, index)| IndexedOffer::new(index, offer))
        .collect();
    Ok(Json(offers))
}

pub async fn mint(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Json(request): Json<MintRequest>,
) -> Result<Json<FlowResponse>, crate::Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let wallet = state.wallet().await?;
    info!(request_id = %request_id, name = %request.name, "Mint requested");
    let report = state.market.mint(wallet.as_ref(), &request).await?;
    Ok(Json(report.into()))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Json(request): Json<ListRequest>,
) -> Result<Json<FlowResponse>, crate::Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let wallet = state.wallet().await?;
    info!(request_id = %request_id, policy_id = %request.policy_id, price = request.price, "Listing requested");
    let report = state.market.list(wallet.as_ref(), &request).await?;
    Ok(Json(report.into()))
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(index): Path<usize>,
) -> Result<Json<FlowResponse>, crate::Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let wallet = state.wallet().await?;
    info!(request_id = %request_id, index, "Cancel requested");
    let report = state.market.cancel(wallet.as_ref(), index).await?;
    Ok(Json(report.into()))
}

pub async fn buy(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(index): Path<usize>,
) -> Result<Json<FlowResponse>, crate::Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let wallet = state.wallet().await?;
    info!(request_id = %request_id, index, "Purchase requested");
    let report = state.market.buy(wallet.as_ref(), index).await?;
    Ok(Json(report.into()))
}
