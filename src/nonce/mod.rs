//! Per-address nonce allocation for managed senders.
//!
//! # Lifecycle
//! ```text
//! NonceAllocator::new  (Uninitialized: no counters)
//!     → initialize()   (Ready: one counter per managed address, seeded from chain)
//!     → next_nonce()   (serves indefinitely; track() adds late addresses)
//! ```
//!
//! # Constraints
//! - Counters live in this process only. Running two orchestrators against the
//!   same addresses will issue duplicate nonces; that deployment is unsupported.
//! - `next_nonce` performs no I/O: read-then-increment happens under the
//!   per-address entry lock of the map.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy::primitives::Address;
use dashmap::DashMap;
use futures_util::future::try_join_all;
use thiserror::Error;

use crate::blockchain::{BlockchainError, ChainRpc};
use crate::observability::metrics;
use crate::store::{AddressStore, StoreError};

/// Errors raised by the nonce allocator.
#[derive(Debug, Error)]
pub enum NonceError {
    /// No counter exists for the address.
    #[error("Nonce for address {0} is not managed")]
    UnmanagedAddress(Address),

    /// Seeding could not read the chain.
    #[error(transparent)]
    Chain(#[from] BlockchainError),

    /// Seeding could not read the managed address list.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// In-process nonce counters, one per managed address.
pub struct NonceAllocator {
    chain: Arc<dyn ChainRpc>,
    addresses: Arc<dyn AddressStore>,
    counters: DashMap<Address, u64>,
    ready: AtomicBool,
}

impl NonceAllocator {
    /// Create an allocator with no counters. Call [`initialize`](Self::initialize) before use.
    pub fn new(chain: Arc<dyn ChainRpc>, addresses: Arc<dyn AddressStore>) -> Self {
        Self {
            chain,
            addresses,
            counters: DashMap::new(),
            ready: AtomicBool::new(false),
        }
    }

    /// Seed every managed address from its on-chain transaction count.
    ///
    /// Re-running re-syncs all counters to the chain. Returns the number seeded.
    pub async fn initialize(&self) -> Result<usize, NonceError> {
        let managed = self.addresses.list_all().await?;

        let seeds = try_join_all(managed.iter().map(|record| {
            let address = record.public_address;
            async move {
                let count = self.chain.get_transaction_count(address).await?;
                Ok::<_, BlockchainError>((address, count))
            }
        }))
        .await?;

        for (address, count) in &seeds {
            self.counters.insert(*address, *count);
            tracing::info!(address = %address, nonce = count, "Initialized nonce");
        }
        self.ready.store(true, Ordering::SeqCst);

        Ok(seeds.len())
    }

    /// Seed (or re-sync) a single address from chain.
    pub async fn track(&self, address: Address) -> Result<u64, NonceError> {
        let count = self.chain.get_transaction_count(address).await?;
        self.counters.insert(address, count);
        tracing::info!(address = %address, nonce = count, "Tracking nonce");
        Ok(count)
    }

    /// Hand out the next nonce for `address` and advance its counter.
    ///
    /// No two calls ever return the same value for the same address.
    pub fn next_nonce(&self, address: &Address) -> Result<u64, NonceError> {
        let mut counter = self
            .counters
            .get_mut(address)
            .ok_or(NonceError::UnmanagedAddress(*address))?;

        let nonce = *counter;
        *counter += 1;
        drop(counter);

        metrics::record_nonce_issued();
        tracing::debug!(address = %address, nonce, "Issued nonce");
        Ok(nonce)
    }

    /// The nonce the next call would return, without consuming it.
    pub fn current(&self, address: &Address) -> Option<u64> {
        self.counters.get(address).map(|c| *c)
    }

    /// Whether [`initialize`](Self::initialize) has completed at least once.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Number of tracked addresses.
    pub fn tracked(&self) -> usize {
        self.counters.len()
    }
}

impl std::fmt::Debug for NonceAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceAllocator")
            .field("tracked", &self.counters.len())
            .field("ready", &self.is_ready())
            .finish()
    }
}
