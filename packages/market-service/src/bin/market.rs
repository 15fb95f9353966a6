//! Marketplace service binary.

use market_service::wallet::EnableOptions;
use market_service::{create_router, AppState, Config};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config();
    info!(
        contract = %config.contract_address,
        storage = %config.storage_dir,
        wallet = %config.wallet_url,
        assembler = %config.assembler_url,
        "Configuration loaded"
    );
    if config.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        info!("API key auth enabled");
    } else {
        warn!("MARKET_API_KEY not set, flow endpoints are unprotected (dev mode)");
    }

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(config)?);
    reconnect_wallet(&state).await;
    info!(offers = state.market.store().len().unwrap_or(0), "Marketplace ready");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Listening");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Marketplace service stopped");
    Ok(())
}

/// A missing file means defaults; anything unparsable stops the process.
fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(config::ConfigError::NotFound(what)) => {
            warn!(missing = %what, "Config source not found, using defaults");
            Config::default()
        }
        Err(e) => {
            error!(error = %e, "FATAL: config error, fix env vars or market.toml");
            std::process::exit(1);
        }
    }
}

/// A wallet that granted access before answers a silent enable; otherwise
/// flows wait for `POST /wallet/connect`.
async fn reconnect_wallet(state: &AppState) {
    let silent = EnableOptions {
        request_identification: false,
        only_silent: true,
    };
    match state.connect(silent).await {
        Ok(()) => info!("Wallet reconnected silently"),
        Err(e) => warn!(error = %e, "No wallet yet, waiting for /wallet/connect"),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("SIGINT received, draining connections"),
                    _ = term.recv() => info!("SIGTERM received, draining connections"),
                }
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, draining connections");
    }
}
