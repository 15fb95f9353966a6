//! Mint flow: time-boxed single-signer policy, CIP-25 metadata.

use market_types::{bytes_to_hex, Cip25Metadata, CIP25_LABEL};
use serde::Deserialize;
use tracing::info;

use super::{Flow, FlowKind, FlowReport, Marketplace};
use crate::assembler::{MintAction, NativeScript, TxPlan};
use crate::wallet::{primary_address, WalletGateway};

/// Ledger limit on asset name length (bytes).
const MAX_ASSET_NAME: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct MintRequest {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub description: String,
}

impl MintRequest {
    fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() || self.name.len() > MAX_ASSET_NAME {
            return Err(crate::Error::InvalidInput(format!(
                "token name must be 1..={MAX_ASSET_NAME} bytes"
            )));
        }
        if self.image.is_empty() {
            return Err(crate::Error::InvalidInput("token image URL is required".into()));
        }
        Ok(())
    }
}

impl Marketplace {
    /// Mint one token under a policy that only the wallet's key can use, and
    /// only before the configured lock slot. The token lands in change.
    pub async fn mint(
        &self,
        wallet: &dyn WalletGateway,
        request: &MintRequest,
    ) -> Result<FlowReport, crate::Error> {
        request.validate()?;
        let mut flow = Flow::start(FlowKind::Mint);

        let address = primary_address(wallet).await?;
        let key_hash = self.assembler.payment_key_hash(&address).await?;
        let lock_slot = self.config.mint.policy_lock_slot;
        let policy = NativeScript::time_locked_signer(key_hash.clone(), lock_slot);
        let policy_id = self.assembler.policy_id(&policy).await?;

        let metadata = Cip25Metadata {
            policy_id: policy_id.clone(),
            asset_name: request.name.clone(),
            image: request.image.clone(),
            description: request.description.clone(),
        };

        let plan = TxPlan {
            inputs: wallet.utxos(None).await?,
            mint: vec![MintAction {
                policy,
                asset_name_hex: bytes_to_hex(request.name.as_bytes()),
                quantity: 1,
            }],
            metadata: [(CIP25_LABEL, metadata.to_json())].into_iter().collect(),
            ttl: Some(lock_slot),
            required_signers: vec![key_hash],
            change_address: wallet.change_address().await?,
            ..TxPlan::default()
        };
        let unsigned = self.assembler.build(&plan, &self.config.protocol).await?;
        info!(policy_id = %policy_id, name = %request.name, "Mint transaction built");

        self.sign_and_submit(&mut flow, wallet, &unsigned, false).await?;

        let mut report = flow.into_report();
        report.policy_id = Some(policy_id);
        Ok(report)
    }
}
