//! Store facade
//!
//! `Store` opens the record store for a model; `EntityBox` scopes reads,
//! writes and queries to one entity type.

mod entity_box;
mod handle;

pub use entity_box::EntityBox;
pub use handle::Store;
pub(crate) use handle::StoreShared;
