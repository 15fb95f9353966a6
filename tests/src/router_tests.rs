//! HTTP surface: routing, status codes and response shapes.

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use market_service::{create_router, Config};
use market_types::Cip25Metadata;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::utils::*;

async fn send(
    state: &Arc<market_service::AppState>,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };
    let response = create_router(state.clone()).oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    Ok((status, value))
}

#[tokio::test]
async fn test_health_reports_degraded_without_wallet() -> Result<()> {
    let (state, _) = app_state(None);

    let (status, body) = send(&state, "GET", "/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["wallet_connected"], false);
    assert_eq!(body["offers"], 0);
    Ok(())
}

#[tokio::test]
async fn test_flow_without_wallet_is_unavailable() -> Result<()> {
    let (state, _) = app_state(None);

    let (status, body) = send(&state, "POST", "/offers/0/buy", None).await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn test_connect_refused_is_unavailable() -> Result<()> {
    let (state, _) = app_state(None);

    let (status, _) = send(&state, "POST", "/wallet/connect", None).await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!state.wallet_connected().await);
    Ok(())
}

#[tokio::test]
async fn test_wallet_assets_show_names_and_metadata() -> Result<()> {
    let wallet = Arc::new(FakeWallet::new(SELLER_HEX));
    let (state, assembler) = app_state(Some(wallet));
    assembler.balance.lock().unwrap().assets = vec![nft("Sunrise")];
    let minted = Cip25Metadata {
        policy_id: POLICY_ID.to_string(),
        asset_name: "Sunrise".into(),
        image: "ipfs://sunrise".into(),
        description: String::new(),
    };
    assembler
        .metadata
        .lock()
        .unwrap()
        .insert(nft("Sunrise").asset.unit(), minted.to_json());
    send(&state, "POST", "/wallet/connect", Some(json!({}))).await?;

    let (status, assets) = send(&state, "GET", "/wallet/assets", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(assets[0]["display_name"], "Sunrise");
    assert_eq!(assets[0]["asset_name_hex"], "53756e72697365");
    assert_eq!(assets[0]["metadata"]["image"], "ipfs://sunrise");
    Ok(())
}

#[tokio::test]
async fn test_listing_below_reserve_is_bad_request() -> Result<()> {
    let wallet = Arc::new(FakeWallet::new(SELLER_HEX));
    let (state, _) = app_state(Some(wallet.clone()));
    send(&state, "POST", "/wallet/connect", Some(json!({}))).await?;

    let listing = json!({ "policy_id": POLICY_ID, "name": "Sunrise", "price": 0 });
    let (status, body) = send(&state, "POST", "/offers", Some(listing)).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(state.market.store().len()?, 0);
    Ok(())
}

#[tokio::test]
async fn test_list_then_browse_then_cancel() -> Result<()> {
    let wallet = Arc::new(FakeWallet::new(SELLER_HEX));
    let (state, _) = app_state(Some(wallet.clone()));

    let (status, _) = send(&state, "POST", "/wallet/connect", Some(json!({}))).await?;
    assert_eq!(status, StatusCode::OK);

    let listing = json!({
        "policy_id": POLICY_ID,
        "name": "Sunrise",
        "image": "ipfs://sunrise",
        "price": 12_000_000u64
    });
    let (status, body) = send(&state, "POST", "/offers", Some(listing)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["report"]["offer_index"], 0);

    let (_, offers) = send(&state, "GET", "/offers", None).await?;
    assert_eq!(offers[0]["index"], 0);
    assert_eq!(offers[0]["name"], "Sunrise");
    assert_eq!(offers[0]["price"], 12_000_000u64);
    assert_eq!(offers[0]["priceAda"], "12");

    let seller_uri = format!("/offers/seller/{}", bech32_of(SELLER_HEX));
    let (_, mine) = send(&state, "GET", &seller_uri, None).await?;
    assert_eq!(mine.as_array().map(Vec::len), Some(1));

    let (status, body) = send(&state, "POST", "/offers/0/cancel", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["kind"], "cancel");
    assert_eq!(state.market.store().len()?, 0);
    assert_eq!(wallet.sign_requests(), vec![false, true]);
    Ok(())
}

#[tokio::test]
async fn test_cancel_unknown_index_is_not_found() -> Result<()> {
    let wallet = Arc::new(FakeWallet::new(SELLER_HEX));
    let (state, _) = app_state(Some(wallet));
    send(&state, "POST", "/wallet/connect", None).await?;

    let (status, body) = send(&state, "POST", "/offers/7/cancel", None).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn test_declined_mint_returns_failed_report() -> Result<()> {
    let wallet = Arc::new(FakeWallet::declining(SELLER_HEX));
    let (state, _) = app_state(Some(wallet));
    send(&state, "POST", "/wallet/connect", None).await?;

    let mint = json!({ "name": "Sunrise", "image": "ipfs://sunrise" });
    let (status, body) = send(&state, "POST", "/mint", Some(mint)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("declined"));
    let last = body["report"]["history"].as_array().unwrap().last().cloned();
    assert_eq!(last.unwrap()["state"], "failed");
    Ok(())
}

#[tokio::test]
async fn test_metrics_are_prometheus_text() -> Result<()> {
    let (state, _) = app_state(None);
    let request = Request::builder().uri("/metrics").body(Body::empty())?;

    let response = create_router(state).oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await?.to_bytes();
    let text = String::from_utf8(bytes.to_vec())?;
    assert!(text.contains("market_offers"));
    assert!(text.contains("# TYPE"));
    Ok(())
}

#[tokio::test]
async fn test_api_key_guards_writes_only() -> Result<()> {
    let wallet = Arc::new(FakeWallet::new(SELLER_HEX));
    let config = Config {
        api_key: Some("s3cret".into()),
        ..Config::default()
    };
    let (state, _) = app_state_with(config, Some(wallet));

    let (status, _) = send(&state, "POST", "/wallet/connect", None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!state.wallet_connected().await);

    let (status, _) = send(&state, "GET", "/offers", None).await?;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method("POST")
        .uri("/wallet/connect")
        .header("x-api-key", "s3cret")
        .body(Body::empty())?;
    let response = create_router(state.clone()).oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());
    assert!(state.wallet_connected().await);
    Ok(())
}

#[tokio::test]
async fn test_request_id_is_echoed() -> Result<()> {
    let (state, _) = app_state(None);
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-42")
        .body(Body::empty())?;

    let response = create_router(state).oneshot(request).await?;

    assert_eq!(response.headers()["x-request-id"], "trace-42");
    Ok(())
}
