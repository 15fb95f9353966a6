//! Prometheus metrics (lock-free atomics, zero allocation on hot path).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::workflow::FlowKind;

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Flows ---
    pub flows_started: AtomicU64,
    pub flows_committed: AtomicU64,
    pub flows_failed: AtomicU64,
    pub mint_committed: AtomicU64,
    pub list_committed: AtomicU64,
    pub cancel_committed: AtomicU64,
    pub buy_committed: AtomicU64,

    // --- Latency (μs) ---
    pub flow_duration_us_sum: AtomicU64,
    pub flow_duration_us_max: AtomicU64,

    // --- Offer store ---
    pub store_writes: AtomicU64,

    // --- Bridges ---
    pub bridge_failovers: AtomicU64,
    pub bridge_errors: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            flows_started: AtomicU64::new(0),
            flows_committed: AtomicU64::new(0),
            flows_failed: AtomicU64::new(0),
            mint_committed: AtomicU64::new(0),
            list_committed: AtomicU64::new(0),
            cancel_committed: AtomicU64::new(0),
            buy_committed: AtomicU64::new(0),
            flow_duration_us_sum: AtomicU64::new(0),
            flow_duration_us_max: AtomicU64::new(0),
            store_writes: AtomicU64::new(0),
            bridge_failovers: AtomicU64::new(0),
            bridge_errors: AtomicU64::new(0),
        }
    }

    pub fn record_committed(&self, kind: FlowKind) {
        self.flows_committed.fetch_add(1, Ordering::Relaxed);
        let per_kind = match kind {
            FlowKind::Mint => &self.mint_committed,
            FlowKind::List => &self.list_committed,
            FlowKind::Cancel => &self.cancel_committed,
            FlowKind::Buy => &self.buy_committed,
        };
        per_kind.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flow_duration(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.flow_duration_us_sum.fetch_add(us, Ordering::Relaxed);
        self.flow_duration_us_max.fetch_max(us, Ordering::Relaxed);
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self, offers: usize, wallet_connected: bool) -> String {
        let started = self.flows_started.load(Ordering::Relaxed);
        let committed = self.flows_committed.load(Ordering::Relaxed);
        let failed = self.flows_failed.load(Ordering::Relaxed);
        let mint = self.mint_committed.load(Ordering::Relaxed);
        let list = self.list_committed.load(Ordering::Relaxed);
        let cancel = self.cancel_committed.load(Ordering::Relaxed);
        let buy = self.buy_committed.load(Ordering::Relaxed);
        let dur_sum = self.flow_duration_us_sum.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        let dur_max = self.flow_duration_us_max.swap(0, Ordering::Relaxed) as f64 / 1_000_000.0;
        let store_writes = self.store_writes.load(Ordering::Relaxed);
        let failovers = self.bridge_failovers.load(Ordering::Relaxed);
        let bridge_errors = self.bridge_errors.load(Ordering::Relaxed);
        let connected = u8::from(wallet_connected);

        format!(
            "\
# HELP market_flows_started_total Flows whose transaction reached the wallet for signing.\n\
# TYPE market_flows_started_total counter\n\
market_flows_started_total {started}\n\
# HELP market_flows_committed_total Flows whose transaction was submitted.\n\
# TYPE market_flows_committed_total counter\n\
market_flows_committed_total {committed}\n\
market_flows_committed_by_kind_total{{kind=\"mint\"}} {mint}\n\
market_flows_committed_by_kind_total{{kind=\"list\"}} {list}\n\
market_flows_committed_by_kind_total{{kind=\"cancel\"}} {cancel}\n\
market_flows_committed_by_kind_total{{kind=\"buy\"}} {buy}\n\
# HELP market_flows_failed_total Flows rejected at signing or submission.\n\
# TYPE market_flows_failed_total counter\n\
market_flows_failed_total {failed}\n\
# HELP market_flow_duration_seconds_sum Total flow time (seconds).\n\
# TYPE market_flow_duration_seconds_sum counter\n\
market_flow_duration_seconds_sum {dur_sum:.6}\n\
# HELP market_flow_duration_seconds_max Max flow time since last scrape (seconds).\n\
# TYPE market_flow_duration_seconds_max gauge\n\
market_flow_duration_seconds_max {dur_max:.6}\n\
# HELP market_store_writes_total Full rewrites of the offer store.\n\
# TYPE market_store_writes_total counter\n\
market_store_writes_total {store_writes}\n\
# HELP market_bridge_failovers_total Bridge primary-to-fallback failovers.\n\
# TYPE market_bridge_failovers_total counter\n\
market_bridge_failovers_total {failovers}\n\
# HELP market_bridge_errors_total Bridge call errors.\n\
# TYPE market_bridge_errors_total counter\n\
market_bridge_errors_total {bridge_errors}\n\
# HELP market_offers Offers currently in the store.\n\
# TYPE market_offers gauge\n\
market_offers {offers}\n\
# HELP market_wallet_connected Whether a wallet handle is enabled.\n\
# TYPE market_wallet_connected gauge\n\
market_wallet_connected {connected}\n"
        )
    }
}
