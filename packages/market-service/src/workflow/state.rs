//! Flow state machine shared by every marketplace flow.
//!
//! `Building -> AwaitingSignature -> Submitting -> Committed`, with failure
//! edges from `AwaitingSignature` and `Submitting`.

use serde::Serialize;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{info, warn};

use crate::metrics::METRICS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Mint,
    List,
    Cancel,
    Buy,
}

impl FlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::Mint => "mint",
            FlowKind::List => "list",
            FlowKind::Cancel => "cancel",
            FlowKind::Buy => "buy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    Building,
    AwaitingSignature,
    Submitting,
    Committed { tx_id: String },
    Failed { reason: String },
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Committed { .. } | FlowState::Failed { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            FlowState::Building => "building",
            FlowState::AwaitingSignature => "awaiting_signature",
            FlowState::Submitting => "submitting",
            FlowState::Committed { .. } => "committed",
            FlowState::Failed { .. } => "failed",
        }
    }

    fn can_move_to(&self, next: &FlowState) -> bool {
        matches!(
            (self, next),
            (FlowState::Building, FlowState::AwaitingSignature)
                | (FlowState::AwaitingSignature, FlowState::Submitting)
                | (FlowState::AwaitingSignature, FlowState::Failed { .. })
                | (FlowState::Submitting, FlowState::Committed { .. })
                | (FlowState::Submitting, FlowState::Failed { .. })
        )
    }
}

/// One run of a flow; records every state it passed through.
#[derive(Debug)]
pub struct Flow {
    kind: FlowKind,
    history: Vec<FlowState>,
    started: Instant,
}

impl Flow {
    /// Begin in `Building`. Metrics count the run as started only once its
    /// transaction reaches the wallet.
    pub fn start(kind: FlowKind) -> Self {
        info!(flow = kind.as_str(), "Flow started");
        Self {
            kind,
            history: vec![FlowState::Building],
            started: Instant::now(),
        }
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn state(&self) -> &FlowState {
        self.history.last().unwrap_or(&FlowState::Building)
    }

    pub fn advance(&mut self, next: FlowState) -> Result<(), crate::Error> {
        let current = self.state();
        if current.is_terminal() {
            return Err(crate::Error::InvalidTransition(format!(
                "{} flow already {}",
                self.kind.as_str(),
                current.name()
            )));
        }
        if !current.can_move_to(&next) {
            return Err(crate::Error::InvalidTransition(format!(
                "{} flow cannot move from {} to {}",
                self.kind.as_str(),
                current.name(),
                next.name()
            )));
        }
        match &next {
            FlowState::AwaitingSignature => {
                METRICS.flows_started.fetch_add(1, Ordering::Relaxed);
                info!(flow = self.kind.as_str(), "Flow awaiting signature");
            }
            FlowState::Committed { tx_id } => {
                METRICS.record_committed(self.kind);
                METRICS.record_flow_duration(self.started);
                info!(flow = self.kind.as_str(), tx_id = %tx_id, "Flow committed");
            }
            FlowState::Failed { reason } => {
                METRICS.flows_failed.fetch_add(1, Ordering::Relaxed);
                METRICS.record_flow_duration(self.started);
                warn!(flow = self.kind.as_str(), reason = %reason, "Flow failed");
            }
            other => info!(flow = self.kind.as_str(), state = other.name(), "Flow advanced"),
        }
        self.history.push(next);
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), crate::Error> {
        self.advance(FlowState::Failed {
            reason: reason.into(),
        })
    }

    pub fn into_report(self) -> FlowReport {
        FlowReport {
            kind: self.kind,
            history: self.history,
            policy_id: None,
            offer_index: None,
            store_error: None,
        }
    }
}

/// Outcome of a flow run returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub kind: FlowKind,
    pub history: Vec<FlowState>,
    /// Minting policy of a mint flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    /// Position of the offer appended by a list flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_index: Option<usize>,
    /// Offer store update that failed after a successful submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
}

impl FlowReport {
    pub fn final_state(&self) -> &FlowState {
        self.history.last().unwrap_or(&FlowState::Building)
    }

    pub fn tx_id(&self) -> Option<&str> {
        match self.final_state() {
            FlowState::Committed { tx_id } => Some(tx_id),
            _ => None,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.tx_id().is_some()
    }

    pub fn failure(&self) -> Option<&str> {
        match self.final_state() {
            FlowState::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}
