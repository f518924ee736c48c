//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::OrchestratorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Comma separated vault keys, newest first. Replaces `vault.keys` when set.
pub const ENCRYPTION_KEYS_ENV_VAR: &str = "ENCRYPTION_KEYS";

/// Primary RPC endpoint. Replaces `blockchain.rpc_url` when set.
pub const RPC_URL_ENV_VAR: &str = "ETHEREUM_RPC_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment overrides, and validate.
///
/// A missing `path` means "defaults plus environment".
pub fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => OrchestratorConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-provided values onto a parsed configuration.
pub fn apply_env_overrides<F>(config: &mut OrchestratorConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(keys) = lookup(ENCRYPTION_KEYS_ENV_VAR) {
        config.vault.keys = keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
    }

    if let Some(url) = lookup(RPC_URL_ENV_VAR) {
        config.blockchain.rpc_url = url;
    }
}
