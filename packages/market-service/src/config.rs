//! Service configuration.
//!
//! Loaded from an optional `market.toml` plus `MARKET_*` environment
//! variables (`__` separates nested keys, e.g. `MARKET_LISTING__RESERVE_LOVELACE`).

use serde::{Deserialize, Serialize};

/// Top-level configuration shared by every flow.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// Directory holding the key-value files (the `offers` record lives here).
    #[serde(default = "defaults::storage_dir")]
    pub storage_dir: String,

    #[serde(default = "defaults::wallet_url")]
    pub wallet_url: String,

    #[serde(default)]
    pub wallet_fallback_url: Option<String>,

    #[serde(default = "defaults::assembler_url")]
    pub assembler_url: String,

    #[serde(default)]
    pub assembler_fallback_url: Option<String>,

    /// Bech32 address of the marketplace contract.
    #[serde(default = "defaults::contract_address")]
    pub contract_address: String,

    /// CBOR hex of the PlutusV2 marketplace validator.
    #[serde(default = "defaults::script_hex")]
    pub script_hex: String,

    /// Key required on state-changing requests (`MARKET_API_KEY`); unset = dev mode.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub protocol: ProtocolParams,

    #[serde(default)]
    pub listing: ListingConfig,

    #[serde(default)]
    pub mint: MintConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: defaults::bind_address(),
            storage_dir: defaults::storage_dir(),
            wallet_url: defaults::wallet_url(),
            wallet_fallback_url: None,
            assembler_url: defaults::assembler_url(),
            assembler_fallback_url: None,
            contract_address: defaults::contract_address(),
            script_hex: defaults::script_hex(),
            api_key: None,
            protocol: ProtocolParams::default(),
            listing: ListingConfig::default(),
            mint: MintConfig::default(),
        }
    }
}

impl Config {
    /// `market.toml` (optional) overlaid with `MARKET_*` environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(environment())
    }

    fn load_from(env: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("market").required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.contract_address.is_empty() {
            return Err(crate::Error::Config("contract_address is empty".into()));
        }
        if hex::decode(self.script_hex.trim()).is_err() {
            return Err(crate::Error::Config("script_hex is not valid hex".into()));
        }
        self.protocol.validate()?;
        self.listing.validate()?;
        if self.mint.policy_lock_slot == 0 {
            return Err(crate::Error::Config("mint.policy_lock_slot must be set".into()));
        }
        Ok(())
    }

    pub fn wallet_fallback(&self) -> &str {
        self.wallet_fallback_url.as_deref().unwrap_or(&self.wallet_url)
    }

    pub fn assembler_fallback(&self) -> &str {
        self.assembler_fallback_url
            .as_deref()
            .unwrap_or(&self.assembler_url)
    }
}

/// `MARKET_` prefix, `__` between nested keys. Without an explicit prefix
/// separator config-rs would expect `MARKET__API_KEY`.
fn environment() -> config::Environment {
    config::Environment::with_prefix("MARKET")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Ratio used for execution-unit prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInterval {
    pub numerator: u64,
    pub denominator: u64,
}

/// Ledger parameters handed to the transaction assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Fee per transaction byte.
    pub min_fee_a: u64,
    /// Constant fee per transaction.
    pub min_fee_b: u64,
    pub coins_per_utxo_word: u64,
    pub pool_deposit: u64,
    pub key_deposit: u64,
    pub mem_price: UnitInterval,
    pub step_price: UnitInterval,
    pub max_value_size: u32,
    pub max_tx_size: u32,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            min_fee_a: 44,
            min_fee_b: 155_381,
            coins_per_utxo_word: 34_482,
            pool_deposit: 500_000_000,
            key_deposit: 2_000_000,
            mem_price: UnitInterval {
                numerator: 577,
                denominator: 10_000,
            },
            step_price: UnitInterval {
                numerator: 721,
                denominator: 10_000_000,
            },
            max_value_size: 5000,
            max_tx_size: 16_384,
        }
    }
}

impl ProtocolParams {
    pub fn validate(&self) -> Result<(), crate::Error> {
        let nonzero = [
            ("min_fee_a", self.min_fee_a),
            ("min_fee_b", self.min_fee_b),
            ("coins_per_utxo_word", self.coins_per_utxo_word),
            ("max_value_size", u64::from(self.max_value_size)),
            ("max_tx_size", u64::from(self.max_tx_size)),
        ];
        for (name, value) in nonzero {
            if value == 0 {
                return Err(crate::Error::Config(format!("protocol.{name} must be > 0")));
            }
        }
        for (name, price) in [("mem_price", self.mem_price), ("step_price", self.step_price)] {
            if price.denominator == 0 {
                return Err(crate::Error::Config(format!(
                    "protocol.{name} has a zero denominator"
                )));
            }
        }
        Ok(())
    }
}

/// Execution budget declared for the marketplace validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

/// Parameters of the list / cancel / buy flows.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Lovelace locked alongside the asset (min-UTxO reserve).
    pub reserve_lovelace: u64,
    /// Collateral requested from the wallet for script spends.
    pub collateral_lovelace: u64,
    pub ex_units: ExUnits,
    /// PlutusV2 cost model used for the script-data hash.
    pub cost_model: Vec<i64>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            reserve_lovelace: 2_000_000,
            collateral_lovelace: 3_000_000,
            ex_units: ExUnits {
                mem: 2_180_128,
                steps: 632_475_719,
            },
            cost_model: defaults::plutus_v2_cost_model(),
        }
    }
}

impl ListingConfig {
    fn validate(&self) -> Result<(), crate::Error> {
        if self.reserve_lovelace == 0 {
            return Err(crate::Error::Config("listing.reserve_lovelace must be > 0".into()));
        }
        if self.collateral_lovelace == 0 {
            return Err(crate::Error::Config(
                "listing.collateral_lovelace must be > 0".into(),
            ));
        }
        if self.cost_model.is_empty() {
            return Err(crate::Error::Config("listing.cost_model is empty".into()));
        }
        Ok(())
    }
}

/// Parameters of the mint flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MintConfig {
    /// Slot after which the minting policy can no longer be used.
    pub policy_lock_slot: u64,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            policy_lock_slot: defaults::policy_lock_slot(),
        }
    }
}

mod defaults {
    pub fn bind_address() -> String {
        "127.0.0.1:3050".into()
    }

    pub fn storage_dir() -> String {
        "./market_data".into()
    }

    pub fn wallet_url() -> String {
        "http://127.0.0.1:8090/cip30".into()
    }

    pub fn assembler_url() -> String {
        "http://127.0.0.1:8091/rpc".into()
    }

    pub fn contract_address() -> String {
        "addr_test1wq0acvhyvhxgcq7kp6gpcv6m44v7cvrp4uyv8lw9ttju35gqk8egf".into()
    }

    pub fn script_hex() -> String {
        include_str!("../contract/marketplace_v2.plutus").trim().to_string()
    }

    pub fn policy_lock_slot() -> u64 {
        90_000_000
    }

    /// PlutusV2 cost model (Vasil) in parameter order.
    pub fn plutus_v2_cost_model() -> Vec<i64> {
        vec![
            205665, 812, 1, 1, 1000, 571, 0, 1, 1000, 24177, 4, 1, 1000, 32, 117366, 10475, 4,
            23000, 100, 23000, 100, 23000, 100, 23000, 100, 23000, 100, 23000, 100, 100, 100,
            23000, 100, 19537, 32, 175354, 32, 46417, 4, 221973, 511, 0, 1, 89141, 32, 497525,
            14068, 4, 2, 196500, 453240, 220, 0, 1, 1, 1000, 28662, 4, 2, 245000, 216773, 62, 1,
            1060367, 12586, 1, 208512, 421, 1, 187000, 1000, 52998, 1, 80436, 32, 43249, 32,
            1000, 32, 80556, 1, 57667, 4, 1000, 10, 197145, 156, 1, 197145, 156, 1, 204924, 473,
            1, 208896, 511, 1, 52467, 32, 64832, 32, 65493, 32, 22558, 32, 16563, 32, 76511, 32,
            196500, 453240, 220, 0, 1, 1, 69522, 11687, 0, 1, 60091, 32, 196500, 453240, 220, 0,
            1, 1, 196500, 453240, 220, 0, 1, 1, 1159724, 392670, 0, 2, 806990, 30482, 4, 1927926,
            82523, 4, 265318, 0, 4, 0, 85931, 32, 205665, 812, 1, 1, 41182, 32, 212342, 32, 31220,
            32, 32696, 32, 43357, 32, 32247, 32, 38314, 32, 20000000000, 20000000000, 9462713,
            1021, 10, 20000000000, 0, 20000000000,
        ]
    }
}
