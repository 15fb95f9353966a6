//! List flow: lock an asset at the contract with an inline price/seller datum.

use market_types::{AssetAmount, AssetId, ListingDatum, OfferRecord};
use serde::Deserialize;
use tracing::{error, info};

use super::{Flow, FlowKind, FlowReport, Marketplace};
use crate::assembler::{TxOutput, TxPlan, TxValue};
use crate::config::ListingConfig;
use crate::wallet::{primary_address, WalletGateway};

/// Policy ids are 28-byte hashes.
const POLICY_ID_HEX_LEN: usize = 56;

#[derive(Debug, Clone, Deserialize)]
pub struct ListRequest {
    pub policy_id: String,
    /// Asset name as text (its on-chain bytes are the UTF-8 encoding).
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    /// Lovelace.
    pub price: u64,
}

impl ListRequest {
    /// The price becomes a plain seller output on buy, so it must clear the
    /// same min-UTxO floor as the listing reserve.
    fn validate(&self, listing: &ListingConfig) -> Result<(), crate::Error> {
        if self.policy_id.len() != POLICY_ID_HEX_LEN || hex::decode(&self.policy_id).is_err() {
            return Err(crate::Error::InvalidInput(format!(
                "policy_id must be {POLICY_ID_HEX_LEN} hex characters"
            )));
        }
        if self.name.is_empty() {
            return Err(crate::Error::InvalidInput("asset name is required".into()));
        }
        if self.price < listing.reserve_lovelace {
            return Err(crate::Error::InvalidInput(format!(
                "price must be at least {} lovelace",
                listing.reserve_lovelace
            )));
        }
        Ok(())
    }
}

impl Marketplace {
    pub async fn list(
        &self,
        wallet: &dyn WalletGateway,
        request: &ListRequest,
    ) -> Result<FlowReport, crate::Error> {
        request.validate(&self.config.listing)?;
        let mut flow = Flow::start(FlowKind::List);
        let contract = self.config.contract_address.clone();

        let seller_hex = primary_address(wallet).await?;
        let seller = self.assembler.address_to_bech32(&seller_hex).await?;
        let seller_key_hash = self.assembler.payment_key_hash(&seller_hex).await?;
        let datum = ListingDatum {
            price: request.price,
            seller_key_hash,
        }
        .to_plutus()?;

        let locked = TxValue::lovelace(self.config.listing.reserve_lovelace).with_asset(AssetAmount {
            asset: AssetId::from_utf8_name(request.policy_id.clone(), &request.name),
            quantity: 1,
        });
        let required = self.assembler.encode_value(&locked).await?;

        let plan = TxPlan {
            inputs: wallet.utxos(Some(&required)).await?,
            outputs: vec![TxOutput {
                address: contract.clone(),
                value: locked,
                inline_datum: Some(datum),
            }],
            change_address: wallet.change_address().await?,
            ..TxPlan::default()
        };
        let unsigned = self.assembler.build(&plan, &self.config.protocol).await?;
        let output_id = unsigned.output_position(&contract).ok_or_else(|| {
            crate::Error::Assembler("built transaction has no contract output".into())
        })?;
        info!(price = request.price, output_id, "Listing transaction built");

        let Some(tx_id) = self.sign_and_submit(&mut flow, wallet, &unsigned, false).await? else {
            return Ok(flow.into_report());
        };

        let record = OfferRecord {
            seller,
            policy_id: request.policy_id.clone(),
            name: request.name.clone(),
            description: request.description.clone(),
            image: request.image.clone(),
            price: request.price,
            transaction_id: tx_id,
            output_id,
        };
        let appended = self.store.append_one(record);
        let mut report = flow.into_report();
        match appended {
            Ok(index) => report.offer_index = Some(index),
            Err(e) => {
                error!(error = %e, "Listing submitted but offer could not be stored");
                report.store_error = Some(e.to_string());
            }
        }
        Ok(report)
    }
}
