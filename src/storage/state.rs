//! Copy-on-write store state
//!
//! A published `StoreState` is immutable. Writers clone the outer map
//! (cheap, tables are `Arc`ed) and copy a table only when they touch it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::index::{IndexEntry, IndexSet};

use super::errors::StorageResult;
use super::record::{LogOp, LogRecord};

/// Records and indexes of one entity type
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub(crate) records: BTreeMap<u64, Arc<[u8]>>,
    pub(crate) indexes: IndexSet,
    /// Highest key ever assigned; keys are never reused
    pub(crate) last_key: u64,
}

impl Table {
    fn put(&mut self, key: u64, body: Arc<[u8]>, entries: &[IndexEntry]) {
        self.records.insert(key, body);
        self.indexes.apply_put(key, entries);
        self.last_key = self.last_key.max(key);
    }

    fn delete(&mut self, key: u64) -> bool {
        let existed = self.records.remove(&key).is_some();
        if existed {
            self.indexes.apply_delete(key);
        }
        existed
    }

    fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        self.indexes.clear();
        removed
    }
}

/// Snapshot of every table
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    tables: BTreeMap<u32, Arc<Table>>,
}

impl StoreState {
    pub fn table(&self, entity_id: u32) -> Option<&Table> {
        self.tables.get(&entity_id).map(Arc::as_ref)
    }

    fn table_mut(&mut self, entity_id: u32) -> &mut Table {
        Arc::make_mut(self.tables.entry(entity_id).or_default())
    }

    /// Reserves the next key of an entity
    pub fn next_key(&mut self, entity_id: u32) -> u64 {
        let table = self.table_mut(entity_id);
        table.last_key += 1;
        table.last_key
    }

    pub fn put(&mut self, entity_id: u32, key: u64, body: Arc<[u8]>, entries: &[IndexEntry]) {
        self.table_mut(entity_id).put(key, body, entries);
    }

    pub fn delete(&mut self, entity_id: u32, key: u64) -> bool {
        let present = self
            .table(entity_id)
            .map_or(false, |t| t.records.contains_key(&key));
        present && self.table_mut(entity_id).delete(key)
    }

    pub fn clear(&mut self, entity_id: u32) -> usize {
        let populated = self
            .table(entity_id)
            .map_or(false, |t| !t.records.is_empty());
        if populated {
            self.table_mut(entity_id).clear()
        } else {
            0
        }
    }

    /// Replaces every index of one entity with entries derived from the
    /// record bodies. Returns the number of records visited.
    pub fn rebuild_indexes<F>(&mut self, entity_id: u32, derive: &mut F) -> StorageResult<usize>
    where
        F: FnMut(u64, &[u8]) -> StorageResult<Vec<IndexEntry>>,
    {
        let Some(table) = self.table(entity_id) else {
            return Ok(0);
        };
        let mut indexes = IndexSet::new();
        for (key, body) in &table.records {
            indexes.apply_put(*key, &derive(*key, body)?);
        }
        let visited = table.records.len();
        self.table_mut(entity_id).indexes = indexes;
        Ok(visited)
    }

    /// Applies a replayed frame; commit frames are no-ops here
    pub fn apply(&mut self, record: &LogRecord) {
        match record.op {
            LogOp::Put => self.put(
                record.entity_id,
                record.key,
                Arc::from(record.body.as_slice()),
                &record.index_entries,
            ),
            LogOp::Delete => {
                self.delete(record.entity_id, record.key);
            }
            LogOp::Clear => {
                self.clear(record.entity_id);
            }
            LogOp::Commit => {}
        }
    }
}
