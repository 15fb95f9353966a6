//! CIP-25 token metadata attached to mint transactions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::AssetId;

/// Transaction metadata label reserved for NFT metadata.
pub const CIP25_LABEL: u64 = 721;

/// Ledger limit for a single metadata text value (bytes).
const MAX_METADATA_STR: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cip25Metadata {
    pub policy_id: String,
    pub asset_name: String,
    pub image: String,
    pub description: String,
}

impl Cip25Metadata {
    /// Body stored under label 721: `{policy: {asset: {name, image, description}}}`.
    pub fn to_json(&self) -> Value {
        let mut asset = Map::new();
        asset.insert("name".into(), json!(self.asset_name));
        asset.insert("image".into(), split_metadata_str(&self.image));
        if !self.description.is_empty() {
            asset.insert("description".into(), split_metadata_str(&self.description));
        }
        let mut by_asset = Map::new();
        by_asset.insert(self.asset_name.clone(), Value::Object(asset));
        let mut by_policy = Map::new();
        by_policy.insert(self.policy_id.clone(), Value::Object(by_asset));
        Value::Object(by_policy)
    }

    /// Entry for `asset` in a label-721 body. Assets are keyed by their text
    /// name, or by the hex name when the bytes are not UTF-8.
    pub fn from_json(body: &Value, asset: &AssetId) -> Option<Self> {
        let by_asset = body.get(&asset.policy_id)?;
        let entry = by_asset
            .get(asset.display_name())
            .or_else(|| by_asset.get(&asset.asset_name_hex))?;
        Some(Self {
            policy_id: asset.policy_id.clone(),
            asset_name: entry
                .get("name")
                .and_then(join_metadata_str)
                .unwrap_or_else(|| asset.display_name()),
            image: entry.get("image").and_then(join_metadata_str).unwrap_or_default(),
            description: entry
                .get("description")
                .and_then(join_metadata_str)
                .unwrap_or_default(),
        })
    }
}

/// Inverse of [`split_metadata_str`]: a string, or an array of string chunks.
fn join_metadata_str(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(chunks) => chunks.iter().map(Value::as_str).collect(),
        _ => None,
    }
}

/// Long strings become an array of chunks no larger than the ledger limit,
/// split on char boundaries.
fn split_metadata_str(text: &str) -> Value {
    if text.len() <= MAX_METADATA_STR {
        return json!(text);
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if current.len() + ch.len_utf8() > MAX_METADATA_STR {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    json!(chunks)
}
