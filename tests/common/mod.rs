//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use wallet_orchestrator::blockchain::{
    BlockchainError, BlockchainResult, ChainRpc, ReceiptSummary, TransactionDetails,
};
use wallet_orchestrator::config::{AddressConfig, TransferConfig};
use wallet_orchestrator::store::{
    MemoryAddressStore, MemoryTransferStore, StoreError, StoreResult, TransferStore,
};
use wallet_orchestrator::{
    AddressProvisioner, KeyVault, NonceAllocator, Transfer, TransferOrchestrator,
};

pub const CHAIN_ID: u64 = 11_155_111;
pub const GWEI: u128 = 1_000_000_000;
pub const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

#[derive(Default)]
struct ChainState {
    tx_counts: HashMap<Address, u64>,
    transactions: HashMap<TxHash, TransactionDetails>,
    receipts: HashMap<TxHash, ReceiptSummary>,
    block_number: u64,
    base_fee: u128,
    gas_estimate: u64,
    broadcasts: Vec<Bytes>,
    fail_broadcasts: bool,
    fail_receipt_waits: bool,
}

/// In-process chain answering from programmable state.
pub struct MockChain {
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                block_number: 100,
                base_fee: 10 * GWEI,
                gas_estimate: 21_000,
                ..Default::default()
            }),
        }
    }

    pub fn set_transaction_count(&self, address: Address, count: u64) {
        self.state.lock().unwrap().tx_counts.insert(address, count);
    }

    pub fn set_block_number(&self, block: u64) {
        self.state.lock().unwrap().block_number = block;
    }

    pub fn insert_transaction(&self, tx: TransactionDetails) {
        self.state.lock().unwrap().transactions.insert(tx.hash, tx);
    }

    pub fn insert_receipt(&self, hash: TxHash, receipt: ReceiptSummary) {
        self.state.lock().unwrap().receipts.insert(hash, receipt);
    }

    pub fn fail_broadcasts(&self, fail: bool) {
        self.state.lock().unwrap().fail_broadcasts = fail;
    }

    pub fn fail_receipt_waits(&self, fail: bool) {
        self.state.lock().unwrap().fail_receipt_waits = fail;
    }

    /// Raw transactions accepted so far, in order.
    pub fn broadcasts(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().broadcasts.clone()
    }

    fn receipt(&self, hash: TxHash) -> Option<ReceiptSummary> {
        self.state.lock().unwrap().receipts.get(&hash).copied()
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn get_transaction(&self, hash: TxHash) -> BlockchainResult<Option<TransactionDetails>> {
        Ok(self.state.lock().unwrap().transactions.get(&hash).cloned())
    }

    async fn get_receipt(&self, hash: TxHash) -> BlockchainResult<Option<ReceiptSummary>> {
        Ok(self.receipt(hash))
    }

    async fn get_block_number(&self) -> BlockchainResult<u64> {
        Ok(self.state.lock().unwrap().block_number)
    }

    async fn get_base_fee(&self) -> BlockchainResult<u128> {
        Ok(self.state.lock().unwrap().base_fee)
    }

    async fn estimate_gas(&self, _request: &TransactionRequest) -> BlockchainResult<u64> {
        Ok(self.state.lock().unwrap().gas_estimate)
    }

    async fn broadcast(&self, raw: Bytes) -> BlockchainResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        if state.fail_broadcasts {
            return Err(BlockchainError::Rpc("broadcast rejected".to_string()));
        }
        let hash = keccak256(&raw);
        state.broadcasts.push(raw);
        Ok(hash)
    }

    async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tx_counts
            .get(&address)
            .copied()
            .unwrap_or(0))
    }

    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        timeout: Duration,
    ) -> BlockchainResult<Option<ReceiptSummary>> {
        if self.state.lock().unwrap().fail_receipt_waits {
            return Err(BlockchainError::Rpc("receipt subscription dropped".to_string()));
        }
        let poll = async {
            loop {
                if let Some(receipt) = self.receipt(hash) {
                    return receipt;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        Ok(tokio::time::timeout(timeout, poll).await.ok())
    }
}

/// In-memory transfer store whose updates can be made to fail.
pub struct FlakyTransferStore {
    inner: MemoryTransferStore,
    fail_updates: AtomicBool,
}

impl FlakyTransferStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryTransferStore::new(),
            fail_updates: AtomicBool::new(false),
        }
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }
}

#[async_trait]
impl TransferStore for FlakyTransferStore {
    async fn create(&self, transfer: Transfer) -> StoreResult<Transfer> {
        self.inner.create(transfer).await
    }

    async fn update(&self, transfer: Transfer) -> StoreResult<Option<Transfer>> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.update(transfer).await
    }

    async fn find_by_hash(&self, tx_hash: TxHash) -> StoreResult<Option<Transfer>> {
        self.inner.find_by_hash(tx_hash).await
    }

    async fn list_all(&self) -> StoreResult<Vec<Transfer>> {
        self.inner.list_all().await
    }

    async fn list_by_address(&self, address: Address) -> StoreResult<Vec<Transfer>> {
        self.inner.list_by_address(address).await
    }
}

/// Orchestrator wired to a mock chain and in-memory stores.
pub struct Harness {
    pub chain: Arc<MockChain>,
    pub transfers: Arc<FlakyTransferStore>,
    pub addresses: Arc<MemoryAddressStore>,
    pub vault: Arc<KeyVault>,
    pub nonces: Arc<NonceAllocator>,
    pub provisioner: AddressProvisioner,
    pub orchestrator: TransferOrchestrator,
}

/// Policy used by most tests: 12 confirmations, 2 gwei tip, 1 second watch timeout.
pub fn transfer_config() -> TransferConfig {
    TransferConfig {
        min_confirmations: 12,
        priority_fee_gwei: 2,
        confirmation_timeout_secs: 1,
    }
}

pub fn harness() -> Harness {
    harness_with(transfer_config())
}

pub fn harness_with(config: TransferConfig) -> Harness {
    let chain = Arc::new(MockChain::new());
    let transfers = Arc::new(FlakyTransferStore::new());
    let addresses = Arc::new(MemoryAddressStore::new());
    let vault = Arc::new(KeyVault::new(&[KeyVault::generate_key()]).unwrap());
    let nonces = Arc::new(NonceAllocator::new(chain.clone(), addresses.clone()));

    let provisioner =
        AddressProvisioner::new(addresses.clone(), vault.clone(), AddressConfig::default());
    let orchestrator = TransferOrchestrator::new(
        chain.clone(),
        transfers.clone(),
        addresses.clone(),
        vault.clone(),
        nonces.clone(),
        config,
        CHAIN_ID,
    );

    Harness {
        chain,
        transfers,
        addresses,
        vault,
        nonces,
        provisioner,
        orchestrator,
    }
}

impl Harness {
    /// Provision `count` addresses and seed the allocator.
    pub async fn managed_addresses(&self, count: usize) -> Vec<Address> {
        let created = self.provisioner.create_addresses(count).await.unwrap();
        self.nonces.initialize().await.unwrap();
        created.into_iter().map(|a| a.public_address).collect()
    }
}

pub fn plain_transfer(hash: TxHash, from: Address, to: Address, value: U256, block: u64) -> TransactionDetails {
    TransactionDetails {
        hash,
        from,
        to: Some(to),
        value,
        input: Bytes::new(),
        block_number: Some(block),
    }
}

pub fn receipt(success: bool, block: u64, gas_used: u64, gas_price_gwei: u128) -> ReceiptSummary {
    ReceiptSummary {
        success,
        block_number: Some(block),
        gas_used,
        effective_gas_price: gas_price_gwei * GWEI,
    }
}

/// Decode a broadcast raw transaction.
pub fn decode(raw: &Bytes) -> TxEnvelope {
    TxEnvelope::decode_2718(&mut &raw[..]).unwrap()
}

pub fn nonce_of(raw: &Bytes) -> u64 {
    decode(raw).nonce()
}
