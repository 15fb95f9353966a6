//! Wallet gateway: the CIP-30 style API a browser wallet exposes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::bridge::{BridgeClient, BridgeError};

// CIP-30 error codes.
const API_REFUSED: i64 = -3;
const API_ACCOUNT_CHANGE: i64 = -4;
const SIGN_PROOF_GENERATION: i64 = 1;
const SIGN_USER_DECLINED: i64 = 2;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableOptions {
    pub request_identification: bool,
    /// Only succeed if access was already granted; never prompt.
    pub only_silent: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Paginate {
    pub page: u32,
    pub limit: u32,
}

/// Obtains an enabled wallet handle.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    async fn enable(&self, options: EnableOptions) -> Result<Arc<dyn WalletGateway>, crate::Error>;
}

/// Enabled wallet. Addresses, UTXOs, values and transactions are CBOR hex.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    async fn used_addresses(&self, paginate: Option<Paginate>) -> Result<Vec<String>, crate::Error>;
    async fn change_address(&self) -> Result<String, crate::Error>;
    /// UTXOs covering `amount` (CBOR value hex) when given, else all.
    async fn utxos(&self, amount: Option<&str>) -> Result<Vec<String>, crate::Error>;
    async fn collateral(&self, lovelace: u64) -> Result<Vec<String>, crate::Error>;
    async fn balance(&self) -> Result<String, crate::Error>;
    /// Returns the witness set produced by the wallet.
    async fn sign_tx(&self, tx_hex: &str, partial_sign: bool) -> Result<String, crate::Error>;
    /// Returns the transaction id.
    async fn submit_tx(&self, tx_hex: &str) -> Result<String, crate::Error>;
}

/// First used address, the wallet's identity for listings.
pub async fn primary_address(wallet: &dyn WalletGateway) -> Result<String, crate::Error> {
    wallet
        .used_addresses(Some(Paginate { page: 0, limit: 1 }))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| crate::Error::WalletUnavailable("wallet has no used address".into()))
}

// --- Bridge implementation ---

pub struct BridgeConnector {
    client: Arc<BridgeClient>,
}

impl BridgeConnector {
    pub fn new(client: Arc<BridgeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WalletConnector for BridgeConnector {
    async fn enable(&self, options: EnableOptions) -> Result<Arc<dyn WalletGateway>, crate::Error> {
        let _: serde_json::Value = self
            .client
            .call("enable", json!([options]))
            .await
            .map_err(|e| {
                warn!(error = %e, silent = options.only_silent, "Wallet enable failed");
                crate::Error::WalletUnavailable(e.to_string())
            })?;
        info!(bridge = %self.client.primary_url(), "Wallet enabled");
        Ok(Arc::new(BridgeWallet {
            client: Arc::clone(&self.client),
        }))
    }
}

pub struct BridgeWallet {
    client: Arc<BridgeClient>,
}

#[async_trait]
impl WalletGateway for BridgeWallet {
    async fn used_addresses(&self, paginate: Option<Paginate>) -> Result<Vec<String>, crate::Error> {
        self.client
            .call("getUsedAddresses", json!([paginate]))
            .await
            .map_err(query_error)
    }

    async fn change_address(&self) -> Result<String, crate::Error> {
        self.client
            .call("getChangeAddress", json!([]))
            .await
            .map_err(query_error)
    }

    async fn utxos(&self, amount: Option<&str>) -> Result<Vec<String>, crate::Error> {
        let utxos: Option<Vec<String>> = self
            .client
            .call("getUtxos", json!([amount]))
            .await
            .map_err(query_error)?;
        // CIP-30: `null` when the amount cannot be covered.
        utxos.ok_or_else(|| crate::Error::WalletUnavailable("insufficient funds for requested amount".into()))
    }

    async fn collateral(&self, lovelace: u64) -> Result<Vec<String>, crate::Error> {
        let utxos: Option<Vec<String>> = self
            .client
            .call("getCollateral", json!([{ "amount": lovelace.to_string() }]))
            .await
            .map_err(query_error)?;
        utxos
            .filter(|u| !u.is_empty())
            .ok_or_else(|| crate::Error::WalletUnavailable("wallet has no collateral set".into()))
    }

    async fn balance(&self) -> Result<String, crate::Error> {
        self.client
            .call("getBalance", json!([]))
            .await
            .map_err(query_error)
    }

    async fn sign_tx(&self, tx_hex: &str, partial_sign: bool) -> Result<String, crate::Error> {
        self.client
            .call_once("signTx", json!([tx_hex, partial_sign]))
            .await
            .map_err(|e| match e {
                BridgeError::Remote(r)
                    if matches!(r.code, SIGN_USER_DECLINED | SIGN_PROOF_GENERATION | API_REFUSED) =>
                {
                    crate::Error::UserRejected(r.info())
                }
                other => crate::Error::Bridge(other.to_string()),
            })
    }

    async fn submit_tx(&self, tx_hex: &str) -> Result<String, crate::Error> {
        self.client
            .call_once("submitTx", json!([tx_hex]))
            .await
            .map_err(|e| match e {
                BridgeError::Remote(r) => crate::Error::SubmitRejected(r.info()),
                other => crate::Error::Bridge(other.to_string()),
            })
    }
}

fn query_error(e: BridgeError) -> crate::Error {
    match e {
        BridgeError::Remote(r) if matches!(r.code, API_REFUSED | API_ACCOUNT_CHANGE) => {
            crate::Error::WalletUnavailable(r.info())
        }
        other => crate::Error::Bridge(other.to_string()),
    }
}
