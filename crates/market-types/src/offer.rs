//! Offer domain types.

use serde::{Deserialize, Serialize};

pub const LOVELACE_PER_ADA: u64 = 1_000_000;

/// A marketplace listing backed by a contract-controlled output.
///
/// Field names follow the persisted JSON layout (`policyId`, `transactionId`,
/// `outputId`). Absent fields decode to their empty value so older stores
/// remain readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfferRecord {
    /// Bech32 address entitled to cancel and to receive the proceeds.
    pub seller: String,
    pub policy_id: String,
    /// Asset name, decoded from its on-chain bytes.
    pub name: String,
    pub description: String,
    pub image: String,
    /// Listed price (lovelace).
    pub price: u64,
    pub transaction_id: String,
    pub output_id: u32,
}

impl OfferRecord {
    /// The on-chain output backing this offer.
    pub fn output_ref(&self) -> OutputRef {
        OutputRef {
            transaction_id: self.transaction_id.clone(),
            output_index: self.output_id,
        }
    }

    pub fn is_sold_by(&self, address: &str) -> bool {
        self.seller == address
    }
}

/// Transaction output reference: `(transactionId, outputIndex)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub transaction_id: String,
    pub output_index: u32,
}

impl std::fmt::Display for OutputRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.transaction_id, self.output_index)
    }
}

/// Display-only conversion; prices are always stored in lovelace.
pub fn lovelace_to_ada(lovelace: u64) -> String {
    let whole = lovelace / LOVELACE_PER_ADA;
    let frac = lovelace % LOVELACE_PER_ADA;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:06}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
