//! In-memory stores with optional JSON snapshot persistence.

use std::collections::HashSet;
use std::fs::{self, File};
use std::hash::Hash;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::addresses::ManagedAddress;
use crate::observability::metrics;
use crate::store::{AddressStore, StoreError, StoreResult, TransferStore};
use crate::transfers::Transfer;

/// Keyed rows remembering insertion order, snapshotted as a JSON array.
struct Table<K, V> {
    rows: DashMap<K, (u64, V)>,
    next_seq: AtomicU64,
    persistence_path: Option<PathBuf>,
    /// Serializes write-then-snapshot so the file always reflects a complete write.
    write_lock: Mutex<()>,
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Serialize + DeserializeOwned,
{
    fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            rows: DashMap::new(),
            next_seq: AtomicU64::new(0),
            persistence_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Open a table, loading the snapshot at `path` if it exists.
    fn load(path: &Path, key_of: fn(&V) -> K) -> StoreResult<Self> {
        let table = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let records: Vec<V> = serde_json::from_reader(reader)?;
            for record in records {
                table.upsert(key_of(&record), record);
            }
            tracing::info!(path = %path.display(), rows = table.rows.len(), "Loaded store snapshot");
        }
        Ok(table)
    }

    fn upsert(&self, key: K, value: V) {
        match self.rows.entry(key) {
            Entry::Occupied(mut row) => row.get_mut().1 = value,
            Entry::Vacant(slot) => {
                slot.insert((self.next_seq.fetch_add(1, Ordering::SeqCst), value));
            }
        }
    }

    /// Upsert `changes` and rewrite the snapshot. Caller holds `write_lock`.
    ///
    /// If the snapshot cannot be written the touched rows are restored, so
    /// memory never holds a change the caller was told failed.
    fn commit(&self, changes: Vec<(K, V)>) -> StoreResult<()> {
        let previous: Vec<(K, Option<(u64, V)>)> = changes
            .iter()
            .map(|(key, _)| (key.clone(), self.rows.get(key).map(|row| row.value().clone())))
            .collect();

        for (key, value) in changes {
            self.upsert(key, value);
        }

        if let Err(e) = self.save_to_file() {
            for (key, row) in previous {
                match row {
                    Some(row) => {
                        self.rows.insert(key, row);
                    }
                    None => {
                        self.rows.remove(&key);
                    }
                }
            }
            tracing::error!(error = %e, "Snapshot write failed; change rolled back");
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, key: &K) -> Option<V> {
        self.rows.get(key).map(|row| row.value().1.clone())
    }

    fn values_where(&self, keep: impl Fn(&V) -> bool) -> Vec<V> {
        let mut rows: Vec<(u64, V)> = self
            .rows
            .iter()
            .filter(|row| keep(&row.value().1))
            .map(|row| row.value().clone())
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, value)| value).collect()
    }

    /// Rewrite the snapshot file. Caller holds `write_lock`.
    fn save_to_file(&self) -> StoreResult<()> {
        if let Some(path) = &self.persistence_path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let tmp = path.with_extension("json.tmp");
            {
                let writer = BufWriter::new(File::create(&tmp)?);
                serde_json::to_writer_pretty(writer, &self.values_where(|_| true))?;
            }
            fs::rename(&tmp, path)?;
        }
        Ok(())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| StoreError::Poisoned)
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Transfer store kept in memory, optionally snapshotted to disk.
pub struct MemoryTransferStore {
    table: Table<TxHash, Transfer>,
}

impl MemoryTransferStore {
    /// Volatile store.
    pub fn new() -> Self {
        Self {
            table: Table::new(None),
        }
    }

    /// Store backed by a JSON snapshot at `path`, loaded if present.
    pub fn load_from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self {
            table: Table::load(path.as_ref(), |t: &Transfer| t.tx_hash)?,
        })
    }

    /// Number of stored transfers.
    pub fn count(&self) -> usize {
        self.table.len()
    }
}

impl Default for MemoryTransferStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferStore for MemoryTransferStore {
    async fn create(&self, transfer: Transfer) -> StoreResult<Transfer> {
        let _guard = self.table.lock()?;
        self.table.commit(vec![(transfer.tx_hash, transfer.clone())])?;
        Ok(transfer)
    }

    async fn update(&self, transfer: Transfer) -> StoreResult<Option<Transfer>> {
        let _guard = self.table.lock()?;
        let Some(mut stored) = self.table.get(&transfer.tx_hash) else {
            return Ok(None);
        };
        stored.status = transfer.status;
        stored.effective_cost = transfer.effective_cost;

        self.table.commit(vec![(stored.tx_hash, stored.clone())])?;
        Ok(Some(stored))
    }

    async fn find_by_hash(&self, tx_hash: TxHash) -> StoreResult<Option<Transfer>> {
        Ok(self.table.get(&tx_hash))
    }

    async fn list_all(&self) -> StoreResult<Vec<Transfer>> {
        Ok(self.table.values_where(|_| true))
    }

    async fn list_by_address(&self, address: Address) -> StoreResult<Vec<Transfer>> {
        Ok(self.table.values_where(|t| t.involves(&address)))
    }
}

/// Address store kept in memory, optionally snapshotted to disk.
pub struct MemoryAddressStore {
    table: Table<Address, ManagedAddress>,
}

impl MemoryAddressStore {
    /// Volatile store.
    pub fn new() -> Self {
        Self {
            table: Table::new(None),
        }
    }

    /// Store backed by a JSON snapshot at `path`, loaded if present.
    pub fn load_from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Self {
            table: Table::load(path.as_ref(), |a: &ManagedAddress| a.public_address)?,
        };
        metrics::record_managed_addresses(store.count());
        Ok(store)
    }

    /// Number of stored addresses.
    pub fn count(&self) -> usize {
        self.table.len()
    }
}

impl Default for MemoryAddressStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressStore for MemoryAddressStore {
    async fn create_many(&self, addresses: Vec<ManagedAddress>) -> StoreResult<()> {
        let _guard = self.table.lock()?;

        let mut batch = HashSet::new();
        for address in &addresses {
            let key = address.public_address;
            if !batch.insert(key) || self.table.rows.contains_key(&key) {
                return Err(StoreError::DuplicateAddress(key));
            }
        }

        self.table.commit(
            addresses
                .into_iter()
                .map(|address| (address.public_address, address))
                .collect(),
        )?;
        metrics::record_managed_addresses(self.table.len());
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<ManagedAddress>> {
        Ok(self.table.values_where(|_| true))
    }

    async fn find_by_address(&self, address: Address) -> StoreResult<Option<ManagedAddress>> {
        Ok(self.table.get(&address))
    }
}
