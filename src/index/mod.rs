//! Index subsystem
//!
//! Indexes are derived, in-memory state. They are rebuilt from the record
//! log on open and updated inside the same write transaction as the
//! records they describe.
//!
//! # Design Principles
//!
//! - Derived state: the record log is the source of truth
//! - Deterministic: BTreeMap iteration order, sorted record keys
//! - Lookups narrow candidates only; every condition is still evaluated

mod btree;
mod set;

pub use btree::{IndexKey, IndexTree, RecordKey};
pub use set::{IndexEntry, IndexSet};
