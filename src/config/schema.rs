//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the orchestrator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the transfer orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Chain RPC settings.
    pub blockchain: BlockchainConfig,

    /// Transfer creation and confirmation policy.
    pub transfers: TransferConfig,

    /// Address provisioning limits.
    pub addresses: AddressConfig,

    /// Symmetric keys protecting private key material at rest.
    pub vault: VaultConfig,

    /// Where transfer and address records are kept.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID used for EIP-155 replay protection (11155111 = Sepolia).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Interval between receipt polls while waiting for a transaction.
    pub receipt_poll_interval_ms: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 11_155_111,
            rpc_timeout_secs: 10,
            receipt_poll_interval_ms: 2_000,
        }
    }
}

/// Transfer policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Blocks (inclusive of the mined block) required before an observed transfer is accepted.
    pub min_confirmations: u64,

    /// Fixed priority fee (tip) in gwei.
    pub priority_fee_gwei: u64,

    /// How long a confirmation watcher waits for a receipt, in seconds.
    pub confirmation_timeout_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            min_confirmations: 12,
            priority_fee_gwei: 2,
            confirmation_timeout_secs: 300,
        }
    }
}

/// Address provisioning configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AddressConfig {
    /// Maximum number of addresses minted by a single provisioning call.
    pub max_per_request: usize,
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self {
            max_per_request: 100,
        }
    }
}

/// Key vault configuration.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct VaultConfig {
    /// URL-safe base64 keys, newest first.
    pub keys: Vec<String>,
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("keys", &format!("<{} redacted>", self.keys.len()))
            .finish()
    }
}

/// Record storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for JSON snapshots. Records stay in memory only when unset.
    pub data_dir: Option<String>,
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
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.transfers.min_confirmations, 12);
        assert_eq!(config.transfers.priority_fee_gwei, 2);
        assert_eq!(config.transfers.confirmation_timeout_secs, 300);
        assert_eq!(config.blockchain.chain_id, 11_155_111);
        assert!(config.vault.keys.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: OrchestratorConfig = toml::from_str(
            r#"
            [transfers]
            min_confirmations = 3

            [vault]
            keys = ["a", "b"]
            "#,
        )
        .unwrap();

        assert_eq!(config.transfers.min_confirmations, 3);
        assert_eq!(config.transfers.priority_fee_gwei, 2);
        assert_eq!(config.vault.keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(config.addresses.max_per_request, 100);
    }

    #[test]
    fn test_vault_debug_redacts_keys() {
        let vault = VaultConfig {
            keys: vec!["super-secret".to_string()],
        };
        let rendered = format!("{:?}", vault);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("1 redacted"));
    }
}
