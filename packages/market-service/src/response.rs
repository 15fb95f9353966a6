//! Response types for the marketplace API.

use serde::Serialize;

use crate::workflow::FlowReport;

/// Response from every flow endpoint.
#[derive(Serialize)]
pub struct FlowResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub report: FlowReport,
}

impl From<FlowReport> for FlowResponse {
    fn from(report: FlowReport) -> Self {
        let error = report
            .failure()
            .map(str::to_string)
            .or_else(|| report.store_error.clone());
        Self {
            success: error.is_none() && report.is_committed(),
            tx_id: report.tx_id().map(str::to_string),
            error,
            report,
        }
    }
}

/// Response from the health endpoint.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub wallet_connected: bool,
    pub contract_address: String,
    pub offers: usize,
    pub uptime_secs: u64,
    pub requests: u64,
}
