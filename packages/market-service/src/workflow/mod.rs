//! Marketplace workflow: orchestrates the wallet gateway and the transaction
//! assembler, then commits the outcome to the offer store.
//!
//! The wallet handle is passed into every flow; nothing here looks it up.

mod list;
mod mint;
mod spend;
mod state;

pub use list::ListRequest;
pub use mint::MintRequest;
pub use state::{Flow, FlowKind, FlowReport, FlowState};

use market_types::{AssetAmount, AssetId, Cip25Metadata};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::assembler::{TxAssembler, UnsignedTx};
use crate::config::Config;
use crate::offer_store::OfferStore;
use crate::signatures::merge_signatures;
use crate::wallet::WalletGateway;

/// An asset the connected wallet could list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletAsset {
    #[serde(flatten)]
    pub amount: AssetAmount,
    pub unit: String,
    /// Decoded asset name, usable as `ListRequest::name`.
    pub display_name: String,
    pub is_nft: bool,
    /// CIP-25 entry from the asset's mint transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Cip25Metadata>,
}

pub struct Marketplace {
    assembler: Arc<dyn TxAssembler>,
    store: Arc<OfferStore>,
    config: Arc<Config>,
}

impl Marketplace {
    pub fn new(assembler: Arc<dyn TxAssembler>, store: Arc<OfferStore>, config: Arc<Config>) -> Self {
        Self {
            assembler,
            store,
            config,
        }
    }

    pub fn store(&self) -> &OfferStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Native assets held by the wallet, candidates for listing. NFTs carry
    /// their CIP-25 metadata when the mint transaction had any; a failed
    /// lookup only drops the metadata.
    pub async fn wallet_assets(
        &self,
        wallet: &dyn WalletGateway,
    ) -> Result<Vec<WalletAsset>, crate::Error> {
        let balance = wallet.balance().await?;
        let value = self.assembler.decode_value(&balance).await?;
        debug!(lovelace = value.lovelace, assets = value.assets.len(), "Wallet balance decoded");
        let held: Vec<AssetAmount> = value.assets.into_iter().filter(|a| a.quantity > 0).collect();

        let nfts: Vec<AssetId> = held
            .iter()
            .filter(|a| a.is_nft())
            .map(|a| a.asset.clone())
            .collect();
        let bodies = if nfts.is_empty() {
            HashMap::new()
        } else {
            self.assembler.asset_metadata(&nfts).await.unwrap_or_else(|e| {
                warn!(assets = nfts.len(), error = %e, "Asset metadata lookup failed");
                HashMap::new()
            })
        };

        Ok(held
            .into_iter()
            .map(|amount| {
                let unit = amount.asset.unit();
                let metadata = bodies
                    .get(&unit)
                    .and_then(|body| Cip25Metadata::from_json(body, &amount.asset));
                WalletAsset {
                    unit,
                    display_name: amount.asset.display_name(),
                    is_nft: amount.is_nft(),
                    metadata,
                    amount,
                }
            })
            .collect())
    }

    /// Sign, merge witnesses, submit. Returns the transaction id, or `None`
    /// once the flow has moved to `Failed`.
    async fn sign_and_submit(
        &self,
        flow: &mut Flow,
        wallet: &dyn WalletGateway,
        unsigned: &UnsignedTx,
        partial_sign: bool,
    ) -> Result<Option<String>, crate::Error> {
        flow.advance(FlowState::AwaitingSignature)?;

        let signed = match self.collect_signatures(wallet, unsigned, partial_sign).await {
            Ok(signed) => signed,
            Err(e) => {
                if !e.is_rejection() {
                    warn!(flow = flow.kind().as_str(), error = %e, "Signing step failed");
                }
                flow.fail(e.to_string())?;
                return Ok(None);
            }
        };

        flow.advance(FlowState::Submitting)?;
        match wallet.submit_tx(&signed).await {
            Ok(tx_id) => {
                flow.advance(FlowState::Committed {
                    tx_id: tx_id.clone(),
                })?;
                Ok(Some(tx_id))
            }
            Err(e) => {
                flow.fail(e.to_string())?;
                Ok(None)
            }
        }
    }

    async fn collect_signatures(
        &self,
        wallet: &dyn WalletGateway,
        unsigned: &UnsignedTx,
        partial_sign: bool,
    ) -> Result<String, crate::Error> {
        let witness_set = wallet.sign_tx(&unsigned.tx_hex, partial_sign).await?;
        let new = self.assembler.witness_vkeys(&witness_set).await?;
        let existing = self.assembler.witness_vkeys(&unsigned.witness_set_hex).await?;
        let vkeys = merge_signatures(&existing, &new);
        self.assembler.finalize(unsigned, &vkeys).await
    }
}
