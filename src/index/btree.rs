//! BTreeMap-based index structures
//!
//! Each tree maps a property value to the record keys holding it. Key
//! lists are kept sorted ascending so lookups are deterministic.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::entity::Value;

/// Ordered key derived from a property value.
///
/// Integers of every width share `Int`; both float widths share `Float`,
/// stored as order-preserving bits of the f64 value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    String(String),
}

impl IndexKey {
    pub fn from_int(v: i64) -> Self {
        IndexKey::Int(v)
    }

    /// Uses bit representation for total ordering. `-0.0` is keyed as `0.0`.
    pub fn from_float(v: f64) -> Self {
        let v = if v == 0.0 { 0.0 } else { v };
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits // negative: flip all bits
        } else {
            bits ^ (1 << 63) // positive: flip sign bit
        };
        IndexKey::Float(ordered)
    }

    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Key under which a stored value is indexed
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(b) => IndexKey::Bool(*b),
            Value::Float(f) => IndexKey::from_float(f64::from(*f)),
            Value::Double(d) => IndexKey::from_float(*d),
            Value::String(s) => IndexKey::String(s.clone()),
            // remaining variants are the integer family
            other => IndexKey::Int(other.as_i64().unwrap_or_default()),
        }
    }
}

/// Record key type
pub type RecordKey = u64;

/// A single property index
#[derive(Debug, Clone, Default)]
pub struct IndexTree {
    tree: BTreeMap<IndexKey, Vec<RecordKey>>,
}

impl IndexTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record key under `key`, keeping the list sorted
    pub fn insert(&mut self, key: IndexKey, record: RecordKey) {
        let records = self.tree.entry(key).or_default();
        if let Err(pos) = records.binary_search(&record) {
            records.insert(pos, record);
        }
    }

    /// Removes a record key; drops `key` once no records remain
    pub fn remove(&mut self, key: &IndexKey, record: RecordKey) {
        if let Some(records) = self.tree.get_mut(key) {
            if let Ok(pos) = records.binary_search(&record) {
                records.remove(pos);
            }
            if records.is_empty() {
                self.tree.remove(key);
            }
        }
    }

    /// Record keys holding exactly `key`, ascending
    pub fn lookup_eq(&self, key: &IndexKey) -> Vec<RecordKey> {
        self.tree.get(key).cloned().unwrap_or_default()
    }

    /// Record keys whose value lies within the bounds, ascending.
    ///
    /// An empty or inverted range yields nothing.
    pub fn lookup_range(&self, lower: Bound<&IndexKey>, upper: Bound<&IndexKey>) -> Vec<RecordKey> {
        if is_empty_range(lower, upper) {
            return Vec::new();
        }

        let mut result: Vec<RecordKey> = self
            .tree
            .range((lower, upper))
            .flat_map(|(_, records)| records.iter().copied())
            .collect();
        result.sort_unstable();
        result
    }

    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    pub fn record_count(&self) -> usize {
        self.tree.values().map(Vec::len).sum()
    }
}

// BTreeMap::range panics on these
fn is_empty_range(lower: Bound<&IndexKey>, upper: Bound<&IndexKey>) -> bool {
    match (lower, upper) {
        (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
        (Bound::Included(lo), Bound::Excluded(hi))
        | (Bound::Excluded(lo), Bound::Included(hi))
        | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_key_ordering() {
        let keys = [-1e9, -1.5, -0.0, 0.0, 0.25, 20000.1, f64::INFINITY]
            .iter()
            .map(|v| IndexKey::from_float(*v))
            .collect::<Vec<_>>();
        for pair in keys.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_integer_widths_share_keys() {
        assert_eq!(IndexKey::from_value(&Value::Short(207)), IndexKey::Int(207));
        assert_eq!(IndexKey::from_value(&Value::Long(207)), IndexKey::Int(207));
    }

    #[test]
    fn test_insert_sorted_and_dedup() {
        let mut tree = IndexTree::new();
        tree.insert(IndexKey::from_int(5), 9);
        tree.insert(IndexKey::from_int(5), 2);
        tree.insert(IndexKey::from_int(5), 9);
        assert_eq!(tree.lookup_eq(&IndexKey::from_int(5)), vec![2, 9]);
        assert_eq!(tree.record_count(), 2);
    }

    #[test]
    fn test_remove_drops_empty_key() {
        let mut tree = IndexTree::new();
        tree.insert(IndexKey::from_string("bar"), 3);
        tree.remove(&IndexKey::from_string("bar"), 3);
        assert_eq!(tree.key_count(), 0);
    }

    #[test]
    fn test_range_bounds() {
        let mut tree = IndexTree::new();
        for (i, key) in (2000..2010).enumerate() {
            tree.insert(IndexKey::from_int(key), i as u64 + 1);
        }
        let lo = IndexKey::from_int(2003);
        let hi = IndexKey::from_int(2006);

        assert_eq!(
            tree.lookup_range(Bound::Included(&lo), Bound::Included(&hi)),
            vec![4, 5, 6, 7]
        );
        assert_eq!(
            tree.lookup_range(Bound::Excluded(&lo), Bound::Unbounded),
            vec![5, 6, 7, 8, 9, 10]
        );
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let mut tree = IndexTree::new();
        tree.insert(IndexKey::from_int(1), 1);
        let lo = IndexKey::from_int(5);
        let hi = IndexKey::from_int(1);
        assert!(tree
            .lookup_range(Bound::Included(&lo), Bound::Included(&hi))
            .is_empty());
        assert!(tree
            .lookup_range(Bound::Excluded(&hi), Bound::Excluded(&hi))
            .is_empty());
    }
}
