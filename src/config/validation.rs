//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds and timeouts > 0)
//! - Check the vault has at least one key and the RPC URL parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OrchestratorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::OrchestratorConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.vault.keys.is_empty() {
        errors.push(ValidationError::new(
            "vault.keys",
            "at least one encryption key is required",
        ));
    }

    if config.transfers.min_confirmations == 0 {
        errors.push(ValidationError::new(
            "transfers.min_confirmations",
            "must be at least 1",
        ));
    }

    if config.transfers.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "transfers.confirmation_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.addresses.max_per_request == 0 {
        errors.push(ValidationError::new(
            "addresses.max_per_request",
            "must be at least 1",
        ));
    }

    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "blockchain.rpc_timeout_secs",
            "must be greater than zero",
        ));
    }

    if let Err(e) = config.blockchain.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new(
            "blockchain.rpc_url",
            format!("invalid URL '{}': {}", config.blockchain.rpc_url, e),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
