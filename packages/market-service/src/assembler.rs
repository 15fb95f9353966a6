//! Transaction assembler: the ledger serialization library seen as a service.
//!
//! The workflow describes each transaction as a [`TxPlan`]; fee computation,
//! coin selection from the supplied inputs, hashing and CBOR encoding happen
//! on the other side of this trait.

use async_trait::async_trait;
use market_types::{AssetAmount, AssetId, OutputRef, PlutusData};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::bridge::BridgeClient;
use crate::config::{ExUnits, ProtocolParams};

/// Lovelace plus native assets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxValue {
    pub lovelace: u64,
    #[serde(default)]
    pub assets: Vec<AssetAmount>,
}

impl TxValue {
    pub fn lovelace(lovelace: u64) -> Self {
        Self {
            lovelace,
            assets: Vec::new(),
        }
    }

    pub fn with_asset(mut self, asset: AssetAmount) -> Self {
        self.assets.push(asset);
        self
    }
}

/// Timelock native script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NativeScript {
    All { scripts: Vec<NativeScript> },
    Pubkey { key_hash: String },
    InvalidHereafter { slot: u64 },
}

impl NativeScript {
    /// Single signer, usable only before `slot`.
    pub fn time_locked_signer(key_hash: impl Into<String>, slot: u64) -> Self {
        NativeScript::All {
            scripts: vec![
                NativeScript::Pubkey {
                    key_hash: key_hash.into(),
                },
                NativeScript::InvalidHereafter { slot },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedeemerTag {
    Spend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redeemer {
    pub tag: RedeemerTag,
    pub index: u32,
    pub data: PlutusData,
    pub ex_units: ExUnits,
}

/// Cost models keyed by Plutus language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostModels {
    #[serde(rename = "PlutusV2")]
    pub plutus_v2: Vec<i64>,
}

/// Where the validator finds the datum of a script input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatumSource {
    /// Datum is stored inline in the spent output; nothing goes in the witness set.
    InlineAt { output: OutputRef },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptInput {
    pub output: OutputRef,
    pub value: TxValue,
    /// PlutusV2 script CBOR hex.
    pub script_hex: String,
    pub datum: DatumSource,
    pub redeemer: Redeemer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Bech32 address.
    pub address: String,
    pub value: TxValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_datum: Option<PlutusData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintAction {
    pub policy: NativeScript,
    pub asset_name_hex: String,
    pub quantity: i64,
}

/// Everything needed to build one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPlan {
    /// Wallet UTXOs (CBOR hex) available for funding.
    pub inputs: Vec<String>,
    pub script_inputs: Vec<ScriptInput>,
    pub outputs: Vec<TxOutput>,
    pub collateral: Vec<String>,
    pub required_signers: Vec<String>,
    pub mint: Vec<MintAction>,
    /// Auxiliary metadata by label.
    pub metadata: BTreeMap<u64, Value>,
    /// Time to live (slot).
    pub ttl: Option<u64>,
    /// Precomputed script-data hash; when set the assembler must not derive its own.
    pub script_data_hash: Option<String>,
    /// Bech32 or hex address receiving change.
    pub change_address: String,
}

/// Built transaction awaiting signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub tx_hex: String,
    /// Witness set already attached by the builder (scripts, redeemers, vkeys).
    pub witness_set_hex: String,
    /// Bech32 address of every output, in transaction order.
    pub outputs: Vec<String>,
}

impl UnsignedTx {
    pub fn output_position(&self, address: &str) -> Option<u32> {
        self.outputs
            .iter()
            .position(|a| a == address)
            .and_then(|p| u32::try_from(p).ok())
    }
}

#[async_trait]
pub trait TxAssembler: Send + Sync {
    async fn address_to_bech32(&self, address_hex: &str) -> Result<String, crate::Error>;
    /// Payment key hash (hex) of a base or enterprise address.
    async fn payment_key_hash(&self, address: &str) -> Result<String, crate::Error>;
    async fn policy_id(&self, script: &NativeScript) -> Result<String, crate::Error>;
    async fn encode_value(&self, value: &TxValue) -> Result<String, crate::Error>;
    async fn decode_value(&self, value_hex: &str) -> Result<TxValue, crate::Error>;
    /// Hash binding redeemers and cost models; datums are excluded.
    async fn script_data_hash(
        &self,
        redeemers: &[Redeemer],
        cost_models: &CostModels,
    ) -> Result<String, crate::Error>;
    async fn build(&self, plan: &TxPlan, params: &ProtocolParams) -> Result<UnsignedTx, crate::Error>;
    /// Vkey witnesses (CBOR hex) contained in a witness set.
    async fn witness_vkeys(&self, witness_set_hex: &str) -> Result<Vec<String>, crate::Error>;
    /// Signed transaction: body of `unsigned` plus its witness set with `vkeys`.
    async fn finalize(&self, unsigned: &UnsignedTx, vkeys: &[String]) -> Result<String, crate::Error>;
    /// Label-721 body of the mint transaction of each asset, keyed by
    /// [`AssetId::unit`]. Assets minted without metadata are absent.
    async fn asset_metadata(&self, assets: &[AssetId]) -> Result<HashMap<String, Value>, crate::Error>;
}

/// Assembler reached through a JSON-RPC bridge.
pub struct BridgeAssembler {
    client: Arc<BridgeClient>,
}

impl BridgeAssembler {
    pub fn new(client: Arc<BridgeClient>) -> Self {
        Self { client }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, crate::Error> {
        self.client
            .call(method, params)
            .await
            .map_err(|e| crate::Error::Assembler(format!("{method}: {e}")))
    }
}

#[async_trait]
impl TxAssembler for BridgeAssembler {
    async fn address_to_bech32(&self, address_hex: &str) -> Result<String, crate::Error> {
        self.call("addressToBech32", json!({ "address": address_hex })).await
    }

    async fn payment_key_hash(&self, address: &str) -> Result<String, crate::Error> {
        self.call("paymentKeyHash", json!({ "address": address })).await
    }

    async fn policy_id(&self, script: &NativeScript) -> Result<String, crate::Error> {
        self.call("policyId", json!({ "script": script })).await
    }

    async fn encode_value(&self, value: &TxValue) -> Result<String, crate::Error> {
        self.call("encodeValue", json!({ "value": value })).await
    }

    async fn decode_value(&self, value_hex: &str) -> Result<TxValue, crate::Error> {
        self.call("decodeValue", json!({ "value": value_hex })).await
    }

    async fn script_data_hash(
        &self,
        redeemers: &[Redeemer],
        cost_models: &CostModels,
    ) -> Result<String, crate::Error> {
        self.call(
            "scriptDataHash",
            json!({ "redeemers": redeemers, "cost_models": cost_models }),
        )
        .await
    }

    async fn build(&self, plan: &TxPlan, params: &ProtocolParams) -> Result<UnsignedTx, crate::Error> {
        self.call("buildTx", json!({ "plan": plan, "params": params })).await
    }

    async fn witness_vkeys(&self, witness_set_hex: &str) -> Result<Vec<String>, crate::Error> {
        self.call("witnessVkeys", json!({ "witness_set": witness_set_hex })).await
    }

    async fn finalize(&self, unsigned: &UnsignedTx, vkeys: &[String]) -> Result<String, crate::Error> {
        self.call("finalizeTx", json!({ "unsigned": unsigned, "vkeys": vkeys })).await
    }

    async fn asset_metadata(&self, assets: &[AssetId]) -> Result<HashMap<String, Value>, crate::Error> {
        let units: Vec<String> = assets.iter().map(AssetId::unit).collect();
        self.call("assetMetadata", json!({ "units": units })).await
    }
}
