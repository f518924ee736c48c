//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export BlockchainConfig from config module to avoid duplication
pub use crate::config::schema::BlockchainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// A value could not be converted between wei and decimal units.
    #[error("Unit conversion error: {0}")]
    Units(String),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// The fields of a mined or pending transaction that transfer handling needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    /// Transaction hash.
    pub hash: TxHash,
    /// Sender.
    pub from: Address,
    /// Receiver; absent for contract creation.
    pub to: Option<Address>,
    /// Native value in wei.
    pub value: U256,
    /// Call input, empty for plain transfers.
    pub input: Bytes,
    /// Block the transaction was mined in, if any.
    pub block_number: Option<u64>,
}

/// The fields of a transaction receipt that transfer handling needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSummary {
    /// Execution succeeded.
    pub success: bool,
    /// Block the transaction was mined in.
    pub block_number: Option<u64>,
    /// Gas consumed by the transaction.
    pub gas_used: u64,
    /// Price per gas actually paid, in wei.
    pub effective_gas_price: u128,
}

impl ReceiptSummary {
    /// Total fee paid in wei (`gas_used × effective_gas_price`).
    pub fn fee_wei(&self) -> U256 {
        U256::from(self.gas_used) * U256::from(self.effective_gas_price)
    }

    /// Confirmations at `latest_block`, counting the inclusion block as the first.
    ///
    /// A receipt without a block number counts as mined at `latest_block`.
    pub fn confirmations(&self, latest_block: u64) -> u64 {
        let mined = self.block_number.unwrap_or(latest_block);
        latest_block.saturating_sub(mined) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_confirmations() {
        let receipt = ReceiptSummary {
            success: true,
            block_number: Some(100),
            gas_used: 21_000,
            effective_gas_price: 1,
        };
        assert_eq!(receipt.confirmations(105), 6);
        assert_eq!(receipt.confirmations(100), 1);
        // Lagging node: never underflows
        assert_eq!(receipt.confirmations(90), 1);

        let unmined = ReceiptSummary {
            block_number: None,
            ..receipt
        };
        assert_eq!(unmined.confirmations(500), 1);
    }

    #[test]
    fn test_receipt_fee() {
        let receipt = ReceiptSummary {
            success: true,
            block_number: Some(1),
            gas_used: 50_000,
            effective_gas_price: 20_000_000_000,
        };
        assert_eq!(receipt.fee_wei(), U256::from(1_000_000_000_000_000u64));
    }
}
