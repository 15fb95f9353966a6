//! Native asset identifiers and hex helpers.

use serde::{Deserialize, Serialize};

use crate::CodecError;

pub fn bytes_to_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>, CodecError> {
    hex::decode(text).map_err(|e| CodecError::InvalidHex(format!("{text:.16}…: {e}")))
}

/// A native asset: minting policy plus hex-encoded asset name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId {
    pub policy_id: String,
    pub asset_name_hex: String,
}

impl AssetId {
    /// Asset whose on-chain name is the UTF-8 bytes of `name`.
    pub fn from_utf8_name(policy_id: impl Into<String>, name: &str) -> Self {
        Self {
            policy_id: policy_id.into(),
            asset_name_hex: bytes_to_hex(name.as_bytes()),
        }
    }

    /// Human-readable name; falls back to the raw hex when the bytes are not UTF-8.
    pub fn display_name(&self) -> String {
        hex_to_bytes(&self.asset_name_hex)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| self.asset_name_hex.clone())
    }

    /// `{policy}.{name_hex}`, the form wallets and explorers accept as a unit.
    pub fn unit(&self) -> String {
        format!("{}.{}", self.policy_id, self.asset_name_hex)
    }
}

/// Quantity of one asset held by a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    #[serde(flatten)]
    pub asset: AssetId,
    pub quantity: u64,
}

impl AssetAmount {
    /// An NFT is a single unit of its asset.
    pub fn is_nft(&self) -> bool {
        self.quantity == 1
    }
}
