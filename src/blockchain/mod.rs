//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Decrypted key material (from the vault, per signing)
//!     → wallet.rs (key generation, signer, EIP-1559 signing)
//!     → transaction.rs (fee parameters, transaction assembly)
//!     → client.rs (RPC connection with timeouts and failover)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Callers depend on [`ChainRpc`], never on a concrete provider

pub mod client;
pub mod transaction;
pub mod types;
pub mod units;
pub mod wallet;

use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

pub use client::BlockchainClient;
pub use types::{
    BlockchainConfig, BlockchainError, BlockchainResult, ChainId, ReceiptSummary,
    TransactionDetails,
};
pub use wallet::Wallet;

/// Chain query and broadcast capability consumed by the orchestrator and nonce allocator.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Transaction by hash, `None` if the node does not know it.
    async fn get_transaction(&self, hash: TxHash) -> BlockchainResult<Option<TransactionDetails>>;

    /// Receipt by hash, `None` while unmined or unknown.
    async fn get_receipt(&self, hash: TxHash) -> BlockchainResult<Option<ReceiptSummary>>;

    /// Latest block number.
    async fn get_block_number(&self) -> BlockchainResult<u64>;

    /// Base fee per gas of the latest block, in wei (0 on pre-London chains).
    async fn get_base_fee(&self) -> BlockchainResult<u128>;

    /// Gas estimate for a fully specified request.
    async fn estimate_gas(&self, request: &TransactionRequest) -> BlockchainResult<u64>;

    /// Submit an EIP-2718 encoded signed transaction, returning its hash.
    async fn broadcast(&self, raw: Bytes) -> BlockchainResult<TxHash>;

    /// Number of transactions sent from `address` (its next on-chain nonce).
    async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64>;

    /// Poll for a receipt until one appears or `timeout` elapses.
    ///
    /// Expiry yields `Ok(None)`; it is inconclusive, not a failure.
    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        timeout: Duration,
    ) -> BlockchainResult<Option<ReceiptSummary>>;
}
