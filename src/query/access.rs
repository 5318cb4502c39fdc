//! Access path selection
//!
//! Selection rules, applied to the leaves directly under the top-level
//! AND (conditions inside an OR never drive an index):
//! 1. Indexed equality beats indexed range
//! 2. Among equals, lowest property id wins; then lowest leaf position
//!
//! Case-insensitive string conditions are not index-eligible because
//! the index orders raw bytes. The path remembers only the leaf position;
//! the key is derived from the leaf's literal at execution time, so
//! rebinding never invalidates the path.

use std::fmt;
use std::ops::Bound;

use crate::index::IndexKey;
use crate::schema::ValueType;

use super::condition::{Condition, ConditionKind, ConditionTree, Literal, Operands, StringOrder};

/// How candidate keys are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPath {
    /// Every key of the entity, ascending
    FullScan,
    /// Index lookup on an equality leaf
    IndexEqual { leaf: usize },
    /// Index range scan on a less/greater/between leaf
    IndexRange { leaf: usize },
}

impl AccessPath {
    pub fn leaf(&self) -> Option<usize> {
        match self {
            AccessPath::FullScan => None,
            AccessPath::IndexEqual { leaf } | AccessPath::IndexRange { leaf } => Some(*leaf),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPath::FullScan => "full scan",
            AccessPath::IndexEqual { .. } => "index equality",
            AccessPath::IndexRange { .. } => "index range",
        }
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Equal,
    Range,
}

/// Picks the access path for a tree
pub fn select_access_path(tree: &ConditionTree) -> AccessPath {
    let mut leaves: Vec<(usize, &Condition)> = Vec::new();
    match tree {
        ConditionTree::Leaf(condition) => leaves.push((0, condition)),
        ConditionTree::And(children) => {
            let mut position = 0;
            for child in children {
                if let ConditionTree::Leaf(condition) = child {
                    leaves.push((position, condition));
                }
                position += child.leaf_count();
            }
        }
        ConditionTree::Or(_) => {}
    }

    leaves
        .into_iter()
        .filter_map(|(position, c)| candidate(c).map(|(rank, id)| (rank, id, position)))
        .min()
        .map_or(AccessPath::FullScan, |(rank, _, leaf)| path_for(rank, leaf))
}

fn path_for(rank: Rank, leaf: usize) -> AccessPath {
    match rank {
        Rank::Equal => AccessPath::IndexEqual { leaf },
        Rank::Range => AccessPath::IndexRange { leaf },
    }
}

fn candidate(condition: &Condition) -> Option<(Rank, u32)> {
    let property = condition.property();
    if !property.indexed {
        return None;
    }
    let folded = condition.order() == StringOrder::CaseInsensitive;
    if property.value_type == ValueType::String && folded {
        return None;
    }
    let rank = match condition.kind() {
        ConditionKind::Equal => Rank::Equal,
        ConditionKind::Less | ConditionKind::Greater => Rank::Range,
        ConditionKind::Between if property.value_type.is_numeric() => Rank::Range,
        _ => return None,
    };
    Some((rank, property.id))
}

/// Index key a literal corresponds to for a property type.
///
/// Integer literals on floating properties are keyed as floats, matching
/// how stored floats are indexed.
pub fn index_key_for(value_type: ValueType, literal: &Literal) -> Option<IndexKey> {
    match literal {
        Literal::Integer(v) if value_type.is_floating() => Some(IndexKey::from_float(*v as f64)),
        Literal::Integer(v) if value_type.is_integer() => Some(IndexKey::from_int(*v)),
        Literal::Floating(v) if value_type.is_floating() => Some(IndexKey::from_float(*v)),
        Literal::Text(s) if value_type == ValueType::String => {
            Some(IndexKey::from_string(s.as_str()))
        }
        Literal::Bool(b) if value_type == ValueType::Bool => Some(IndexKey::Bool(*b)),
        _ => None,
    }
}

/// Lookup derived from an index-eligible leaf
#[derive(Debug, Clone, PartialEq)]
pub enum IndexProbe {
    Equal(IndexKey),
    Range(Bound<IndexKey>, Bound<IndexKey>),
}

impl IndexProbe {
    /// Builds the probe from the leaf's current literals
    pub fn for_condition(condition: &Condition) -> Option<Self> {
        let value_type = condition.property().value_type;
        let key = |l: &Literal| index_key_for(value_type, l);
        match (condition.kind(), condition.operands()) {
            (ConditionKind::Equal, Operands::One(l)) => Some(IndexProbe::Equal(key(l)?)),
            (ConditionKind::Less, Operands::One(l)) => {
                Some(IndexProbe::Range(Bound::Unbounded, Bound::Excluded(key(l)?)))
            }
            (ConditionKind::Greater, Operands::One(l)) => {
                Some(IndexProbe::Range(Bound::Excluded(key(l)?), Bound::Unbounded))
            }
            (ConditionKind::Between, Operands::Two(lo, hi)) => Some(IndexProbe::Range(
                Bound::Included(key(lo)?),
                Bound::Included(key(hi)?),
            )),
            _ => None,
        }
    }
}
