//! Read and write transactions
//!
//! A `ReadTxn` pins one published snapshot for its whole lifetime. A
//! `WriteTxn` holds the writer lock, mutates a private copy of the state
//! and publishes it on commit. Dropping a `WriteTxn` aborts it.

use std::ops::Bound;
use std::sync::{Arc, MutexGuard};

use crate::index::{IndexEntry, IndexKey};
use crate::observability::Logger;

use super::engine::{Storage, WriterSlot};
use super::errors::StorageResult;
use super::record::LogRecord;
use super::state::StoreState;

/// Read access to one consistent view of the records
pub trait RecordRead {
    /// All keys of an entity, ascending
    fn scan_keys(&self, entity_id: u32) -> Vec<u64>;

    fn get(&self, entity_id: u32, key: u64) -> Option<Arc<[u8]>>;

    fn count(&self, entity_id: u32) -> usize;

    /// Keys indexed under exactly `key`, ascending.
    ///
    /// `None` if the property has no index tree.
    fn index_equal(&self, entity_id: u32, property_id: u32, key: &IndexKey) -> Option<Vec<u64>>;

    /// Keys whose indexed value lies within the bounds, ascending.
    ///
    /// `None` if the property has no index tree.
    fn index_range(
        &self,
        entity_id: u32,
        property_id: u32,
        lower: Bound<&IndexKey>,
        upper: Bound<&IndexKey>,
    ) -> Option<Vec<u64>>;
}

impl RecordRead for StoreState {
    fn scan_keys(&self, entity_id: u32) -> Vec<u64> {
        self.table(entity_id)
            .map(|t| t.records.keys().copied().collect())
            .unwrap_or_default()
    }

    fn get(&self, entity_id: u32, key: u64) -> Option<Arc<[u8]>> {
        self.table(entity_id)
            .and_then(|t| t.records.get(&key))
            .cloned()
    }

    fn count(&self, entity_id: u32) -> usize {
        self.table(entity_id).map_or(0, |t| t.records.len())
    }

    fn index_equal(&self, entity_id: u32, property_id: u32, key: &IndexKey) -> Option<Vec<u64>> {
        let tree = self.table(entity_id)?.indexes.tree(property_id)?;
        Some(tree.lookup_eq(key))
    }

    fn index_range(
        &self,
        entity_id: u32,
        property_id: u32,
        lower: Bound<&IndexKey>,
        upper: Bound<&IndexKey>,
    ) -> Option<Vec<u64>> {
        let tree = self.table(entity_id)?.indexes.tree(property_id)?;
        Some(tree.lookup_range(lower, upper))
    }
}

/// Snapshot read transaction
pub struct ReadTxn {
    snapshot: Arc<StoreState>,
}

impl ReadTxn {
    pub(crate) fn new(snapshot: Arc<StoreState>) -> Self {
        Self { snapshot }
    }
}

impl RecordRead for ReadTxn {
    fn scan_keys(&self, entity_id: u32) -> Vec<u64> {
        self.snapshot.scan_keys(entity_id)
    }

    fn get(&self, entity_id: u32, key: u64) -> Option<Arc<[u8]>> {
        self.snapshot.get(entity_id, key)
    }

    fn count(&self, entity_id: u32) -> usize {
        self.snapshot.count(entity_id)
    }

    fn index_equal(&self, entity_id: u32, property_id: u32, key: &IndexKey) -> Option<Vec<u64>> {
        self.snapshot.index_equal(entity_id, property_id, key)
    }

    fn index_range(
        &self,
        entity_id: u32,
        property_id: u32,
        lower: Bound<&IndexKey>,
        upper: Bound<&IndexKey>,
    ) -> Option<Vec<u64>> {
        self.snapshot.index_range(entity_id, property_id, lower, upper)
    }
}

/// Exclusive write transaction
///
/// Reads through a `WriteTxn` see its own uncommitted changes.
pub struct WriteTxn<'a> {
    storage: &'a Storage,
    writer: MutexGuard<'a, WriterSlot>,
    state: StoreState,
    pending: Vec<LogRecord>,
}

impl<'a> WriteTxn<'a> {
    pub(crate) fn new(
        storage: &'a Storage,
        writer: MutexGuard<'a, WriterSlot>,
        state: StoreState,
    ) -> Self {
        Self {
            storage,
            writer,
            state,
            pending: Vec::new(),
        }
    }

    /// Reserves the next key of an entity
    pub fn next_key(&mut self, entity_id: u32) -> u64 {
        self.state.next_key(entity_id)
    }

    /// Stores `body` under `key`, assigning a fresh key when `key == 0`.
    ///
    /// Returns the key written.
    pub fn put(
        &mut self,
        entity_id: u32,
        key: u64,
        body: Vec<u8>,
        index_entries: Vec<IndexEntry>,
    ) -> u64 {
        let key = if key == 0 {
            self.next_key(entity_id)
        } else {
            key
        };
        self.state
            .put(entity_id, key, Arc::from(body.as_slice()), &index_entries);
        self.pending
            .push(LogRecord::put(entity_id, key, index_entries, body));
        key
    }

    /// Returns false if no record existed under `key`
    pub fn delete(&mut self, entity_id: u32, key: u64) -> bool {
        let existed = self.state.delete(entity_id, key);
        if existed {
            self.pending.push(LogRecord::delete(entity_id, key));
        }
        existed
    }

    /// Deletes every record of an entity; returns how many there were
    pub fn delete_all(&mut self, entity_id: u32) -> usize {
        let removed = self.state.clear(entity_id);
        if removed > 0 {
            self.pending.push(LogRecord::clear(entity_id));
        }
        removed
    }

    /// Number of operations staged so far
    pub fn pending_ops(&self) -> usize {
        self.pending.len()
    }

    /// Makes the staged changes durable and visible.
    ///
    /// On failure nothing is published and the previous snapshot stays
    /// current. Returns the number of operations committed.
    pub fn commit(self) -> StorageResult<usize> {
        let WriteTxn {
            storage,
            mut writer,
            state,
            mut pending,
        } = self;

        let ops = pending.len();
        if ops == 0 {
            return Ok(0);
        }

        let sync = storage.sync_on_commit();
        let sequence = writer.commit_seq + 1;
        if let Some(log) = writer.log.as_mut() {
            pending.push(LogRecord::commit(sequence));
            log.append_batch(&pending, sync)?;
        }
        writer.commit_seq = sequence;

        storage.publish(state);

        if Logger::enabled(crate::observability::Severity::Trace) {
            Logger::trace(
                "TXN_COMMIT",
                &[
                    ("ops", ops.to_string().as_str()),
                    ("sequence", sequence.to_string().as_str()),
                ],
            );
        }
        Ok(ops)
    }

    /// Discards the staged changes
    pub fn abort(self) {}
}

impl RecordRead for WriteTxn<'_> {
    fn scan_keys(&self, entity_id: u32) -> Vec<u64> {
        self.state.scan_keys(entity_id)
    }

    fn get(&self, entity_id: u32, key: u64) -> Option<Arc<[u8]>> {
        self.state.get(entity_id, key)
    }

    fn count(&self, entity_id: u32) -> usize {
        self.state.count(entity_id)
    }

    fn index_equal(&self, entity_id: u32, property_id: u32, key: &IndexKey) -> Option<Vec<u64>> {
        self.state.index_equal(entity_id, property_id, key)
    }

    fn index_range(
        &self,
        entity_id: u32,
        property_id: u32,
        lower: Bound<&IndexKey>,
        upper: Bound<&IndexKey>,
    ) -> Option<Vec<u64>> {
        self.state.index_range(entity_id, property_id, lower, upper)
    }
}
