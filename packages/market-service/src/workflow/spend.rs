//! Cancel and buy flows: spend a listing output through the contract.

use market_types::{AssetAmount, AssetId, MarketRedeemer, OfferRecord};
use tracing::{error, info, warn};

use super::{Flow, FlowKind, FlowReport, Marketplace};
use crate::assembler::{
    CostModels, DatumSource, Redeemer, RedeemerTag, ScriptInput, TxOutput, TxPlan, TxValue,
};
use crate::wallet::{primary_address, WalletGateway};

impl Marketplace {
    /// Withdraw the offer at `index`. Only its seller may cancel.
    pub async fn cancel(
        &self,
        wallet: &dyn WalletGateway,
        index: usize,
    ) -> Result<FlowReport, crate::Error> {
        let offer = self.store.get(index)?;
        let caller = primary_address(wallet).await?;
        let caller = self.assembler.address_to_bech32(&caller).await?;
        if !offer.is_sold_by(&caller) {
            warn!(index, caller = %caller, "Cancel refused for non-seller");
            return Err(crate::Error::Unauthorized(format!(
                "offer {index} belongs to {}",
                offer.seller
            )));
        }
        self.spend_listing(wallet, index, offer, MarketRedeemer::Cancel).await
    }

    /// Pay the seller of the offer at `index` and take the asset.
    pub async fn buy(
        &self,
        wallet: &dyn WalletGateway,
        index: usize,
    ) -> Result<FlowReport, crate::Error> {
        let offer = self.store.get(index)?;
        self.spend_listing(wallet, index, offer, MarketRedeemer::Paid).await
    }

    async fn spend_listing(
        &self,
        wallet: &dyn WalletGateway,
        index: usize,
        offer: OfferRecord,
        path: MarketRedeemer,
    ) -> Result<FlowReport, crate::Error> {
        let kind = match path {
            MarketRedeemer::Cancel => FlowKind::Cancel,
            MarketRedeemer::Paid => FlowKind::Buy,
        };
        let mut flow = Flow::start(kind);
        let listing = &self.config.listing;
        let output = offer.output_ref();

        let redeemer = Redeemer {
            tag: RedeemerTag::Spend,
            index: 0,
            data: path.to_plutus(),
            ex_units: listing.ex_units,
        };
        let script_input = ScriptInput {
            output: output.clone(),
            value: TxValue::lovelace(listing.reserve_lovelace).with_asset(AssetAmount {
                asset: AssetId::from_utf8_name(offer.policy_id.clone(), &offer.name),
                quantity: 1,
            }),
            script_hex: self.config.script_hex.clone(),
            datum: DatumSource::InlineAt {
                output: output.clone(),
            },
            redeemer: redeemer.clone(),
        };

        // The datum is inline in the listing output, so the hash covers only
        // redeemers and cost models.
        let cost_models = CostModels {
            plutus_v2: listing.cost_model.clone(),
        };
        let script_data_hash = self
            .assembler
            .script_data_hash(std::slice::from_ref(&redeemer), &cost_models)
            .await?;

        let (outputs, required_signers) = match path {
            MarketRedeemer::Cancel => (
                Vec::new(),
                vec![self.assembler.payment_key_hash(&offer.seller).await?],
            ),
            MarketRedeemer::Paid => (
                vec![TxOutput {
                    address: offer.seller.clone(),
                    value: TxValue::lovelace(offer.price),
                    inline_datum: None,
                }],
                Vec::new(),
            ),
        };

        let plan = TxPlan {
            inputs: wallet.utxos(None).await?,
            script_inputs: vec![script_input],
            outputs,
            collateral: wallet.collateral(listing.collateral_lovelace).await?,
            required_signers,
            script_data_hash: Some(script_data_hash),
            change_address: wallet.change_address().await?,
            ..TxPlan::default()
        };
        let unsigned = self.assembler.build(&plan, &self.config.protocol).await?;
        info!(flow = kind.as_str(), index, output = %output, "Spend transaction built");

        // The wallet cannot witness the script input.
        if self
            .sign_and_submit(&mut flow, wallet, &unsigned, true)
            .await?
            .is_none()
        {
            return Ok(flow.into_report());
        }

        let removed = self.store.remove_matching(index, &output);
        let mut report = flow.into_report();
        if let Err(e) = removed {
            error!(index, error = %e, "Spend submitted but offer could not be removed");
            report.store_error = Some(e.to_string());
        }
        Ok(report)
    }
}
