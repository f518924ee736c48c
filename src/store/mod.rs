//! Record storage contracts and the bundled implementations.
//!
//! # Contracts
//! - [`TransferStore`]: upsert-by-hash, never duplicates a transaction hash
//! - [`AddressStore`]: batch insert, list, lookup by public address
//!
//! # Implementations
//! - `memory.rs`: `DashMap` tables kept in insertion order, optionally snapshotted
//!   to a JSON file after every write and reloaded on open

pub mod memory;

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use thiserror::Error;

use crate::addresses::ManagedAddress;
use crate::transfers::Transfer;

pub use memory::{MemoryAddressStore, MemoryTransferStore};

/// Errors raised by record stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Snapshot file could not be read or written.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot file is not valid JSON for the record type.
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A batch contained an address that is already stored.
    #[error("Address {0} is already stored")]
    DuplicateAddress(Address),

    /// A writer panicked while holding the write lock.
    #[error("Store write lock poisoned")]
    Poisoned,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for transfer records.
#[async_trait]
pub trait TransferStore: Send + Sync {
    /// Insert, or replace the record with the same hash.
    async fn create(&self, transfer: Transfer) -> StoreResult<Transfer>;

    /// Update status and effective cost of an existing record. `None` if absent.
    async fn update(&self, transfer: Transfer) -> StoreResult<Option<Transfer>>;

    async fn find_by_hash(&self, tx_hash: TxHash) -> StoreResult<Option<Transfer>>;

    /// Every record, oldest first.
    async fn list_all(&self) -> StoreResult<Vec<Transfer>>;

    /// Records where `address` is sender or receiver, oldest first.
    async fn list_by_address(&self, address: Address) -> StoreResult<Vec<Transfer>>;
}

/// Persistence for managed addresses.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Insert all addresses or none.
    async fn create_many(&self, addresses: Vec<ManagedAddress>) -> StoreResult<()>;

    /// Every address, oldest first.
    async fn list_all(&self) -> StoreResult<Vec<ManagedAddress>>;

    async fn find_by_address(&self, address: Address) -> StoreResult<Option<ManagedAddress>>;
}
