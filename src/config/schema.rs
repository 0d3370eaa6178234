//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! custody service. All types derive Serde traits for deserialization from
//! config files, and every section has defaults so a minimal file works.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Environment variable overriding `custody.master_key`.
pub const MASTER_KEY_ENV_VAR: &str = "CUSTODIAN_MASTER_KEY";

/// Root configuration for the custody service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CustodianConfig {
    /// HTTP API settings.
    pub server: ServerConfig,

    /// Supported chains, keyed by chain name.
    pub chains: BTreeMap<String, ChainConfig>,

    /// Withdrawal drain settings.
    pub withdrawal: WithdrawalConfig,

    /// Key custody settings.
    pub custody: CustodyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Per-chain settings: RPC endpoint plus the deposit-scan tunables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Confirmations required before a deposit is Confirmed.
    pub min_confirmations: u32,

    /// Deposit scan interval in seconds.
    pub poll_interval_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 1,
            rpc_timeout_secs: 10,
            min_confirmations: 1,
            poll_interval_secs: 5,
        }
    }
}

/// Withdrawal drain configuration. One shared timer drives all chains.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WithdrawalConfig {
    /// Drain interval in seconds.
    pub interval_secs: u64,

    /// Maximum pending withdrawals fetched per chain per tick.
    pub batch_size: usize,
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            batch_size: 10,
        }
    }
}

/// Key custody configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CustodyConfig {
    /// 32-byte AES-256-GCM key, hex encoded. Prefer the
    /// `CUSTODIAN_MASTER_KEY` environment variable over this field so the
    /// key never lands in a config file on disk.
    pub master_key: String,
}

impl CustodyConfig {
    /// Resolve the master key, giving the environment precedence.
    pub fn resolved_master_key(&self) -> String {
        std::env::var(MASTER_KEY_ENV_VAR).unwrap_or_else(|_| self.master_key.clone())
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_sections() {
        let config = CustodianConfig::default();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert!(config.chains.is_empty());
        assert_eq!(config.withdrawal.batch_size, 10);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn minimal_toml_parses() {
        let config: CustodianConfig = toml::from_str(
            r#"
            [chains.ethereum]
            rpc_url = "http://localhost:8545"
            chain_id = 31337
            min_confirmations = 3
            "#,
        )
        .unwrap();

        let eth = &config.chains["ethereum"];
        assert_eq!(eth.chain_id, 31337);
        assert_eq!(eth.min_confirmations, 3);
        // Unspecified fields fall back to defaults.
        assert_eq!(eth.poll_interval_secs, 5);
        assert_eq!(config.withdrawal.interval_secs, 10);
    }
}
