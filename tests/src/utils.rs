//! In-process wallet and assembler doubles plus a marketplace wired to them.

use async_trait::async_trait;
use market_service::assembler::{
    CostModels, NativeScript, Redeemer, TxAssembler, TxPlan, TxValue, UnsignedTx,
};
use market_service::config::ProtocolParams;
use market_service::offer_store::OfferStore;
use market_service::storage::{KeyValueStore, MemoryStore};
use market_service::wallet::{EnableOptions, Paginate, WalletConnector, WalletGateway};
use market_service::workflow::Marketplace;
use market_service::{AppState, Config, Error};
use market_types::{AssetAmount, AssetId, OfferRecord};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SELLER_HEX: &str = "00a1b2c3d4";
pub const BUYER_HEX: &str = "00e5f6a7b8";
pub const KEY_HASH: &str = "5a3b9f0c1d2e4f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4";
pub const POLICY_ID: &str = "c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00";

/// Bech32 form the fake assembler gives a hex address.
pub fn bech32_of(address_hex: &str) -> String {
    format!("addr_test1q{address_hex}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutcome {
    Approve,
    Decline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accept,
    Reject,
}

/// Wallet that answers from fixed data and records what it was asked to do.
pub struct FakeWallet {
    pub address_hex: String,
    pub sign: SignOutcome,
    pub submit: SubmitOutcome,
    /// `partial_sign` flag of every signing request.
    pub sign_requests: Mutex<Vec<bool>>,
    pub submitted: Mutex<Vec<String>>,
}

impl FakeWallet {
    pub fn new(address_hex: &str) -> Self {
        Self {
            address_hex: address_hex.to_string(),
            sign: SignOutcome::Approve,
            submit: SubmitOutcome::Accept,
            sign_requests: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn declining(address_hex: &str) -> Self {
        Self {
            sign: SignOutcome::Decline,
            ..Self::new(address_hex)
        }
    }

    pub fn rejecting_submit(address_hex: &str) -> Self {
        Self {
            submit: SubmitOutcome::Reject,
            ..Self::new(address_hex)
        }
    }

    pub fn sign_requests(&self) -> Vec<bool> {
        self.sign_requests.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletGateway for FakeWallet {
    async fn used_addresses(&self, _paginate: Option<Paginate>) -> Result<Vec<String>, Error> {
        Ok(vec![self.address_hex.clone()])
    }

    async fn change_address(&self) -> Result<String, Error> {
        Ok(self.address_hex.clone())
    }

    async fn utxos(&self, _amount: Option<&str>) -> Result<Vec<String>, Error> {
        Ok(vec!["utxo_0".into(), "utxo_1".into()])
    }

    async fn collateral(&self, _lovelace: u64) -> Result<Vec<String>, Error> {
        Ok(vec!["collateral_0".into()])
    }

    async fn balance(&self) -> Result<String, Error> {
        Ok("balance_cbor".into())
    }

    async fn sign_tx(&self, _tx_hex: &str, partial_sign: bool) -> Result<String, Error> {
        self.sign_requests.lock().unwrap().push(partial_sign);
        match self.sign {
            SignOutcome::Approve => Ok("wallet_witness_set".into()),
            SignOutcome::Decline => Err(Error::UserRejected("user declined to sign".into())),
        }
    }

    async fn submit_tx(&self, tx_hex: &str) -> Result<String, Error> {
        match self.submit {
            SubmitOutcome::Accept => {
                let mut submitted = self.submitted.lock().unwrap();
                submitted.push(tx_hex.to_string());
                Ok(format!("tx_{:02}", submitted.len()))
            }
            SubmitOutcome::Reject => Err(Error::SubmitRejected("node refused transaction".into())),
        }
    }
}

/// Connector handing out one prepared wallet, or refusing.
pub struct FakeConnector {
    pub wallet: Option<Arc<FakeWallet>>,
}

#[async_trait]
impl WalletConnector for FakeConnector {
    async fn enable(&self, options: EnableOptions) -> Result<Arc<dyn WalletGateway>, Error> {
        match &self.wallet {
            Some(wallet) if !options.only_silent => Ok(wallet.clone() as Arc<dyn WalletGateway>),
            _ => Err(Error::WalletUnavailable("user refused access".into())),
        }
    }
}

/// Assembler that records plans and places the change output first, so
/// contract outputs never sit at position 0.
#[derive(Default)]
pub struct FakeAssembler {
    pub plans: Mutex<Vec<TxPlan>>,
    pub finalized: Mutex<Vec<Vec<String>>>,
    pub hashed_redeemers: Mutex<Vec<Redeemer>>,
    pub balance: Mutex<TxValue>,
    /// Label-721 bodies served by `asset_metadata`, keyed by unit.
    pub metadata: Mutex<HashMap<String, Value>>,
    pub metadata_queries: Mutex<Vec<Vec<String>>>,
    pub metadata_unavailable: Mutex<bool>,
}

impl FakeAssembler {
    pub fn last_plan(&self) -> TxPlan {
        self.plans.lock().unwrap().last().cloned().expect("no plan built")
    }

    pub fn last_vkeys(&self) -> Vec<String> {
        self.finalized.lock().unwrap().last().cloned().expect("nothing finalized")
    }
}

#[async_trait]
impl TxAssembler for FakeAssembler {
    async fn address_to_bech32(&self, address_hex: &str) -> Result<String, Error> {
        Ok(bech32_of(address_hex))
    }

    async fn payment_key_hash(&self, _address: &str) -> Result<String, Error> {
        Ok(KEY_HASH.to_string())
    }

    async fn policy_id(&self, _script: &NativeScript) -> Result<String, Error> {
        Ok(POLICY_ID.to_string())
    }

    async fn encode_value(&self, value: &TxValue) -> Result<String, Error> {
        Ok(format!("value_{}", value.lovelace))
    }

    async fn decode_value(&self, _value_hex: &str) -> Result<TxValue, Error> {
        Ok(self.balance.lock().unwrap().clone())
    }

    async fn script_data_hash(
        &self,
        redeemers: &[Redeemer],
        _cost_models: &CostModels,
    ) -> Result<String, Error> {
        self.hashed_redeemers
            .lock()
            .unwrap()
            .extend(redeemers.iter().cloned());
        Ok("script_data_hash".into())
    }

    async fn build(&self, plan: &TxPlan, _params: &ProtocolParams) -> Result<UnsignedTx, Error> {
        self.plans.lock().unwrap().push(plan.clone());
        let mut outputs = vec![bech32_of(&plan.change_address)];
        outputs.extend(plan.outputs.iter().map(|o| o.address.clone()));
        Ok(UnsignedTx {
            tx_hex: "unsigned_tx".into(),
            witness_set_hex: "builder_witness_set".into(),
            outputs,
        })
    }

    async fn witness_vkeys(&self, witness_set_hex: &str) -> Result<Vec<String>, Error> {
        match witness_set_hex {
            "builder_witness_set" => Ok(vec!["VK_SCRIPT_OWNER".into()]),
            "wallet_witness_set" => Ok(vec!["vk_wallet".into(), "vk_script_owner".into()]),
            other => Err(Error::Assembler(format!("unknown witness set {other}"))),
        }
    }

    async fn finalize(&self, _unsigned: &UnsignedTx, vkeys: &[String]) -> Result<String, Error> {
        self.finalized.lock().unwrap().push(vkeys.to_vec());
        Ok("signed_tx".into())
    }

    async fn asset_metadata(&self, assets: &[AssetId]) -> Result<HashMap<String, Value>, Error> {
        let units: Vec<String> = assets.iter().map(AssetId::unit).collect();
        self.metadata_queries.lock().unwrap().push(units.clone());
        if *self.metadata_unavailable.lock().unwrap() {
            return Err(Error::Assembler("assetMetadata: indexer offline".into()));
        }
        let known = self.metadata.lock().unwrap();
        Ok(units
            .into_iter()
            .filter_map(|unit| known.get(&unit).map(|body| (unit, body.clone())))
            .collect())
    }
}

pub struct Harness {
    pub market: Marketplace,
    pub assembler: Arc<FakeAssembler>,
    pub backend: Arc<MemoryStore>,
}

pub fn harness() -> Harness {
    let assembler = Arc::new(FakeAssembler::default());
    let backend = Arc::new(MemoryStore::new());
    let store = Arc::new(OfferStore::new(backend.clone() as Arc<dyn KeyValueStore>));
    let market = Marketplace::new(
        assembler.clone() as Arc<dyn TxAssembler>,
        store,
        Arc::new(Config::default()),
    );
    Harness {
        market,
        assembler,
        backend,
    }
}

/// App state whose connector grants `wallet` on an interactive enable.
pub fn app_state(wallet: Option<Arc<FakeWallet>>) -> (Arc<AppState>, Arc<FakeAssembler>) {
    app_state_with(Config::default(), wallet)
}

pub fn app_state_with(
    config: Config,
    wallet: Option<Arc<FakeWallet>>,
) -> (Arc<AppState>, Arc<FakeAssembler>) {
    let assembler = Arc::new(FakeAssembler::default());
    let state = AppState::from_parts(
        config,
        Arc::new(FakeConnector { wallet }),
        assembler.clone() as Arc<dyn TxAssembler>,
        Arc::new(MemoryStore::new()),
    );
    (Arc::new(state), assembler)
}

pub fn sample_offer(seller_hex: &str, n: u32) -> OfferRecord {
    OfferRecord {
        seller: bech32_of(seller_hex),
        policy_id: POLICY_ID.to_string(),
        name: format!("Token{n}"),
        description: "a test token".into(),
        image: format!("ipfs://image{n}"),
        price: 10_000_000 + u64::from(n),
        transaction_id: format!("{n:064x}"),
        output_id: 1,
    }
}

pub fn nft(name: &str) -> AssetAmount {
    AssetAmount {
        asset: AssetId::from_utf8_name(POLICY_ID.to_string(), name),
        quantity: 1,
    }
}
