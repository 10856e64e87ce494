//! Monitor configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use statemon_types::Endpoint;

use crate::NodeError;

/// Configuration for the state monitor.
///
/// Can be loaded from a TOML file via [`MonitorConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// This node's public endpoint. Used to find the users it serves and to
    /// keep it out of its own peer set.
    #[serde(default)]
    pub self_endpoint: String,

    /// Discovery node queried for the users this node serves.
    #[serde(default)]
    pub discovery_node_endpoint: String,

    /// Users processed per monitoring cycle.
    #[serde(default = "default_users_per_job")]
    pub users_per_job: usize,

    /// Timeout for each peer health probe, in milliseconds.
    #[serde(default = "default_peer_health_timeout_ms")]
    pub peer_health_timeout_ms: u64,

    /// Deadline for one peer to answer its whole clock status query, in milliseconds.
    #[serde(default = "default_clock_fetch_timeout_ms")]
    pub clock_fetch_timeout_ms: u64,

    /// Maximum wallets per clock status request.
    #[serde(default = "default_max_user_clock_fetch_batch_size")]
    pub max_user_clock_fetch_batch_size: usize,

    /// Pause between consecutive monitoring cycles, in milliseconds.
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to collect Prometheus metrics for each cycle.
    #[serde(default)]
    pub enable_metrics: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_users_per_job() -> usize {
    1000
}

fn default_peer_health_timeout_ms() -> u64 {
    5_000
}

fn default_clock_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_max_user_clock_fetch_batch_size() -> usize {
    5000
}

fn default_monitor_interval_ms() -> u64 {
    1_000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl MonitorConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check that the settings describe a runnable monitor.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.self_endpoint().is_empty() {
            return Err(NodeError::Config("self_endpoint must be set".into()));
        }
        if self.discovery_node_endpoint.trim().is_empty() {
            return Err(NodeError::Config(
                "discovery_node_endpoint must be set".into(),
            ));
        }
        if self.users_per_job == 0 {
            return Err(NodeError::Config("users_per_job must be at least 1".into()));
        }
        if self.max_user_clock_fetch_batch_size == 0 {
            return Err(NodeError::Config(
                "max_user_clock_fetch_batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn self_endpoint(&self) -> Endpoint {
        Endpoint::new(self.self_endpoint.as_str())
    }

    pub fn peer_health_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_health_timeout_ms)
    }

    pub fn clock_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.clock_fetch_timeout_ms)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            self_endpoint: String::new(),
            discovery_node_endpoint: String::new(),
            users_per_job: default_users_per_job(),
            peer_health_timeout_ms: default_peer_health_timeout_ms(),
            clock_fetch_timeout_ms: default_clock_fetch_timeout_ms(),
            max_user_clock_fetch_batch_size: default_max_user_clock_fetch_batch_size(),
            monitor_interval_ms: default_monitor_interval_ms(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
        }
    }
}
