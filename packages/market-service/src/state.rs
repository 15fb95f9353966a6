//! Application state shared across handlers.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::info;

use crate::assembler::{BridgeAssembler, TxAssembler};
use crate::bridge::BridgeClient;
use crate::config::Config;
use crate::offer_store::OfferStore;
use crate::storage::{FileStore, KeyValueStore};
use crate::wallet::{BridgeConnector, EnableOptions, WalletConnector, WalletGateway};
use crate::workflow::Marketplace;

/// Shared application state.
pub struct AppState {
    pub config: Arc<Config>,
    pub market: Marketplace,
    connector: Arc<dyn WalletConnector>,
    wallet: RwLock<Option<Arc<dyn WalletGateway>>>,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState {
    /// Wire bridges and the file-backed store from configuration.
    pub fn new(config: Config) -> Result<Self, crate::Error> {
        config.validate()?;

        let wallet_bridge = Arc::new(BridgeClient::new(
            "wallet",
            &config.wallet_url,
            config.wallet_fallback(),
        ));
        let assembler_bridge = Arc::new(BridgeClient::new(
            "assembler",
            &config.assembler_url,
            config.assembler_fallback(),
        ));
        let backend = Arc::new(FileStore::new(&config.storage_dir));
        info!(dir = %config.storage_dir, "Offer store backend ready");

        Ok(Self::from_parts(
            config,
            Arc::new(BridgeConnector::new(wallet_bridge)),
            Arc::new(BridgeAssembler::new(assembler_bridge)),
            backend,
        ))
    }

    pub fn from_parts(
        config: Config,
        connector: Arc<dyn WalletConnector>,
        assembler: Arc<dyn TxAssembler>,
        backend: Arc<dyn KeyValueStore>,
    ) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(OfferStore::new(backend));
        Self {
            market: Marketplace::new(assembler, store, Arc::clone(&config)),
            config,
            connector,
            wallet: RwLock::new(None),
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    /// Enable the wallet and keep the handle for later flows.
    pub async fn connect(&self, options: EnableOptions) -> Result<(), crate::Error> {
        let handle = self.connector.enable(options).await?;
        *self.wallet.write().await = Some(handle);
        Ok(())
    }

    /// The enabled wallet handle; flows do not start without one.
    pub async fn wallet(&self) -> Result<Arc<dyn WalletGateway>, crate::Error> {
        self.wallet
            .read()
            .await
            .clone()
            .ok_or_else(|| crate::Error::WalletUnavailable("wallet not connected".into()))
    }

    pub async fn wallet_connected(&self) -> bool {
        self.wallet.read().await.is_some()
    }
}
