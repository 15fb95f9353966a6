//! JSON-RPC 2.0 bridge client with primary → fallback failover and circuit breaker.
//!
//! The wallet extension and the transaction assembler live outside this
//! process; both are reached through a bridge speaking JSON-RPC over HTTP.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::metrics::METRICS;

const CIRCUIT_BREAKER_THRESHOLD: u64 = 5;
const CIRCUIT_BREAKER_WINDOW_MS: u64 = 30_000;

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);
/// Signing waits on a human.
const INTERACTIVE_TIMEOUT: Duration = Duration::from_secs(300);

struct CircuitState {
    failures: u64,
    last_failure_ms: u64,
    open: bool,
}

/// Error object returned by the remote side.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RemoteError {
    /// Human-readable detail; CIP-30 bridges put it in `data.info`.
    pub fn info(&self) -> String {
        self.data
            .as_ref()
            .and_then(|d| d.get("info"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.message.clone())
    }
}

#[derive(Debug)]
pub enum BridgeError {
    /// Endpoint unreachable or returned a non-JSON-RPC body.
    Transport(String),
    /// Endpoint answered with a JSON-RPC error object.
    Remote(RemoteError),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Transport(msg) => write!(f, "transport: {msg}"),
            BridgeError::Remote(e) => write!(f, "remote error {}: {}", e.code, e.info()),
        }
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RemoteError>,
}

pub struct BridgeClient {
    name: &'static str,
    http: reqwest::Client,
    primary_url: String,
    fallback_url: String,
    circuit: Mutex<CircuitState>,
    next_id: AtomicU64,
}

impl BridgeClient {
    pub fn new(name: &'static str, primary_url: &str, fallback_url: &str) -> Self {
        info!(
            bridge = name,
            primary = primary_url,
            fallback = fallback_url,
            "Bridge client initialized with failover"
        );
        Self {
            name,
            http: reqwest::Client::new(),
            primary_url: primary_url.to_string(),
            fallback_url: fallback_url.to_string(),
            circuit: Mutex::new(CircuitState {
                failures: 0,
                last_failure_ms: 0,
                open: false,
            }),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn primary_url(&self) -> &str {
        &self.primary_url
    }

    /// Idempotent query. Transport failures fall back to the secondary endpoint.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, BridgeError> {
        let url = self.active_url().to_string();
        let value = match self.post(&url, method, &params, QUERY_TIMEOUT).await {
            Ok(v) => {
                self.record_success();
                v
            }
            Err(BridgeError::Transport(e)) if url != self.fallback_url => {
                self.record_failure();
                warn!(bridge = self.name, method, error = %e, "Primary bridge failed, trying fallback");
                self.post(&self.fallback_url, method, &params, QUERY_TIMEOUT)
                    .await
                    .map_err(|e2| {
                        METRICS.bridge_errors.fetch_add(1, Ordering::Relaxed);
                        match e2 {
                            BridgeError::Transport(e2) => BridgeError::Transport(format!(
                                "{method} failed on both endpoints: primary={e}, fallback={e2}"
                            )),
                            remote => remote,
                        }
                    })?
            }
            Err(e) => {
                METRICS.bridge_errors.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        decode(method, value)
    }

    /// Non-idempotent or interactive call (signing, submission). Sent once.
    pub async fn call_once<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, BridgeError> {
        let url = self.active_url().to_string();
        let value = self
            .post(&url, method, &params, INTERACTIVE_TIMEOUT)
            .await
            .inspect_err(|_| {
                METRICS.bridge_errors.fetch_add(1, Ordering::Relaxed);
            })?;
        decode(method, value)
    }

    async fn post(
        &self,
        url: &str,
        method: &str,
        params: &Value,
        timeout: Duration,
    ) -> Result<Value, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(bridge = self.name, method, id, "Bridge request");
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        let status = response.status();
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::Transport(format!("HTTP {status}: invalid body: {e}")))?;
        match (parsed.result, parsed.error) {
            (_, Some(err)) => Err(BridgeError::Remote(err)),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }

    // --- Failover / circuit breaker ---

    fn active_url(&self) -> &str {
        if self.is_circuit_open() {
            &self.fallback_url
        } else {
            &self.primary_url
        }
    }

    fn record_success(&self) {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        if circuit.failures > 0 {
            info!(bridge = self.name, primary = %self.primary_url, "Primary bridge recovered");
            circuit.failures = 0;
            circuit.open = false;
        }
    }

    fn record_failure(&self) {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        circuit.failures += 1;
        circuit.last_failure_ms = now_ms();
        if circuit.failures >= CIRCUIT_BREAKER_THRESHOLD && !circuit.open {
            circuit.open = true;
            METRICS.bridge_failovers.fetch_add(1, Ordering::Relaxed);
            warn!(
                bridge = self.name,
                failures = circuit.failures,
                fallback = %self.fallback_url,
                "Circuit breaker opened, routing to fallback"
            );
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        if !circuit.open {
            return false;
        }
        if now_ms().saturating_sub(circuit.last_failure_ms) > CIRCUIT_BREAKER_WINDOW_MS {
            circuit.open = false;
            circuit.failures = 0;
            info!(bridge = self.name, primary = %self.primary_url, "Circuit breaker half-open, retrying primary");
            return false;
        }
        true
    }
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, BridgeError> {
    serde_json::from_value(value)
        .map_err(|e| BridgeError::Transport(format!("{method}: unexpected result shape: {e}")))
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
