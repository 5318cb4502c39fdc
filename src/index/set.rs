//! Per-table collection of property indexes

use std::collections::{BTreeMap, HashMap};

use super::btree::{IndexKey, IndexTree, RecordKey};

/// Index entry: property id and the key it is indexed under
pub type IndexEntry = (u32, IndexKey);

/// All index trees of one table.
///
/// Trees are created on first insert. The set also remembers which
/// entries each record contributed so an overwrite or delete can retract
/// them without decoding the old body.
#[derive(Debug, Clone, Default)]
pub struct IndexSet {
    trees: BTreeMap<u32, IndexTree>,
    entries: HashMap<RecordKey, Vec<IndexEntry>>,
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entries of `record`
    pub fn apply_put(&mut self, record: RecordKey, entries: &[IndexEntry]) {
        self.apply_delete(record);
        if entries.is_empty() {
            return;
        }
        for (property_id, key) in entries {
            self.trees
                .entry(*property_id)
                .or_default()
                .insert(key.clone(), record);
        }
        self.entries.insert(record, entries.to_vec());
    }

    pub fn apply_delete(&mut self, record: RecordKey) {
        if let Some(old) = self.entries.remove(&record) {
            for (property_id, key) in &old {
                if let Some(tree) = self.trees.get_mut(property_id) {
                    tree.remove(key, record);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.trees.clear();
        self.entries.clear();
    }

    /// Tree for a property, if any record has been indexed under it
    pub fn tree(&self, property_id: u32) -> Option<&IndexTree> {
        self.trees.get(&property_id)
    }
}
