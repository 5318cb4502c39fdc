//! Result sorting for query execution
//!
//! Sort keys are extracted once per matching record, so the comparison
//! never decodes anything. Ties on every key fall back to ascending id,
//! which makes the order total and repeatable.

use std::cmp::Ordering;

use crate::entity::{Entity, Value};
use crate::query::{OrderKey, OrderSpec};

use super::filters::fold_case;

/// One extracted sort key
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SortValue {
    fn extract(entity: &Entity, key: &OrderKey) -> Self {
        match entity.get(&key.property) {
            None => SortValue::Null,
            Some(Value::Bool(b)) => SortValue::Bool(*b),
            Some(Value::Float(v)) => SortValue::Float(f64::from(*v)),
            Some(Value::Double(v)) => SortValue::Float(*v),
            Some(Value::String(s)) if key.flags.is_case_sensitive() => SortValue::Text(s.clone()),
            Some(Value::String(s)) => SortValue::Text(fold_case(s)),
            Some(other) => other.as_i64().map_or(SortValue::Null, SortValue::Int),
        }
    }

    fn cmp_values(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Bool(a), SortValue::Bool(b)) => a.cmp(b),
            (SortValue::Int(a), SortValue::Int(b)) => a.cmp(b),
            (SortValue::Float(a), SortValue::Float(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// A matching record with its pre-extracted sort keys
#[derive(Debug, Clone)]
pub struct SortRow {
    pub id: u64,
    keys: Vec<SortValue>,
}

impl SortRow {
    pub fn extract(entity: &Entity, order: &OrderSpec) -> Self {
        Self {
            id: entity.id(),
            keys: order
                .keys()
                .iter()
                .map(|key| SortValue::extract(entity, key))
                .collect(),
        }
    }
}

/// Sorts matching rows
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts rows by the order keys, primary first.
    ///
    /// Null placement does not flip with direction: nulls lead unless the
    /// key asks for `NULLS_LAST`.
    pub fn sort(rows: &mut [SortRow], order: &OrderSpec) {
        let keys = order.keys();
        rows.sort_by(|a, b| {
            for (i, key) in keys.iter().enumerate() {
                let ordering = Self::compare_key(&a.keys[i], &b.keys[i], key);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.id.cmp(&b.id)
        });
    }

    fn compare_key(a: &SortValue, b: &SortValue, key: &OrderKey) -> Ordering {
        let nulls_last = key.flags.nulls_last();
        match (a, b) {
            (SortValue::Null, SortValue::Null) => Ordering::Equal,
            (SortValue::Null, _) if nulls_last => Ordering::Greater,
            (SortValue::Null, _) => Ordering::Less,
            (_, SortValue::Null) if nulls_last => Ordering::Less,
            (_, SortValue::Null) => Ordering::Greater,
            _ => {
                let ordering = a.cmp_values(b);
                if key.flags.is_descending() {
                    ordering.reverse()
                } else {
                    ordering
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::OrderFlags;
    use crate::schema::{PropertyDescriptor, ValueType};

    fn text_prop() -> PropertyDescriptor {
        PropertyDescriptor {
            entity_id: 1,
            id: 1,
            name: "simpleString".into(),
            value_type: ValueType::String,
            indexed: false,
            ordinal: 0,
        }
    }

    fn sorted(values: &[Option<&str>], flags: OrderFlags) -> Vec<Option<String>> {
        let prop = text_prop();
        let entities: Vec<Entity> = values
            .iter()
            .enumerate()
            .map(|(i, v)| Entity::from_parts(i as u64 + 1, vec![v.map(Value::from)]))
            .collect();
        let mut order = OrderSpec::new();
        order.push(prop.clone(), flags);
        let mut rows: Vec<SortRow> = entities.iter().map(|e| SortRow::extract(e, &order)).collect();
        ResultSorter::sort(&mut rows, &order);
        rows.iter()
            .map(|r| entities[r.id as usize - 1].get_str(&prop).map(str::to_string))
            .collect()
    }

    const FIXTURE: [Option<&str>; 7] = [
        Some("banana"),
        Some("apple"),
        Some("bar"),
        Some("banana milk shake"),
        Some("foo bar"),
        Some("BAR"),
        None,
    ];

    fn owned(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_case_insensitive_ascending_ties_by_id() {
        assert_eq!(
            sorted(&FIXTURE, OrderFlags::NONE),
            owned(&[
                None,
                Some("apple"),
                Some("banana"),
                Some("banana milk shake"),
                Some("bar"),
                Some("BAR"),
                Some("foo bar"),
            ])
        );
    }

    #[test]
    fn test_descending_case_sensitive_nulls_last() {
        let flags = OrderFlags::DESCENDING | OrderFlags::CASE_SENSITIVE | OrderFlags::NULLS_LAST;
        assert_eq!(
            sorted(&FIXTURE, flags),
            owned(&[
                Some("foo bar"),
                Some("bar"),
                Some("banana milk shake"),
                Some("banana"),
                Some("apple"),
                Some("BAR"),
                None,
            ])
        );
    }

    #[test]
    fn test_descending_keeps_nulls_first() {
        let out = sorted(&[Some("a"), None, Some("b")], OrderFlags::DESCENDING);
        assert_eq!(out, owned(&[None, Some("b"), Some("a")]));
    }
}
