//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use turing_gateway::RpcGatewayConfig;
use turing_types::CandidateRegistry;

use crate::logging::LogFormat;
use crate::ClientError;

/// Configuration for a Turing client.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// HTTP JSON-RPC endpoint of the ledger node.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// WebSocket endpoint for contract notifications.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Address of the deployed voting contract.
    #[serde(default = "default_contract_address")]
    pub contract_address: String,

    /// Caller account used for submissions, if the node needs one.
    #[serde(default)]
    pub account: Option<String>,

    /// Candidate names, in registry order. Order breaks ranking ties.
    #[serde(default = "CandidateRegistry::default_names")]
    pub candidates: Vec<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum wait for a submitted transaction to confirm.
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    /// Vote-cast notifications closer together than this share one
    /// ranking refresh. 0 disables coalescing.
    #[serde(default)]
    pub coalesce_window_ms: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to print Prometheus metrics on exit.
    #[serde(default)]
    pub enable_metrics: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_ws_url() -> String {
    "ws://127.0.0.1:8546".to_string()
}

fn default_contract_address() -> String {
    "0x5fbdb2315678afecb367f032d93f642f64180aa3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ClientError> {
        toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// The validated candidate registry.
    pub fn registry(&self) -> Result<CandidateRegistry, ClientError> {
        Ok(CandidateRegistry::new(&self.candidates)?)
    }

    pub fn log_format(&self) -> Result<LogFormat, ClientError> {
        self.log_format.parse()
    }

    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }

    /// Connection settings for the JSON-RPC gateway.
    pub fn gateway_config(&self) -> RpcGatewayConfig {
        RpcGatewayConfig {
            rpc_url: self.rpc_url.clone(),
            ws_url: self.ws_url.clone(),
            contract_address: self.contract_address.clone(),
            account: self.account.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            ..RpcGatewayConfig::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            ws_url: default_ws_url(),
            contract_address: default_contract_address(),
            account: None,
            candidates: CandidateRegistry::default_names(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            coalesce_window_ms: 0,
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
        }
    }
}
