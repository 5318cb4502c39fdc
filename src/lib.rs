//! boxquery - an embedded object store with a declarative query engine
//!
//! Entities are property-tagged records identified by a 64-bit key. Queries
//! are assembled with a [`QueryBuilder`], frozen into a reusable [`Query`]
//! and executed against a consistent snapshot of the record store.
//!
//! ```ignore
//! let store = Store::open(StoreConfig::in_memory(), model)?;
//! let users = store.entity_box("User")?;
//! let age = users.schema().require_property("age")?.clone();
//!
//! let query = users.query().greater(&age, 30).order(&age).build()?;
//! let adults = query.find()?;
//! query.set_parameter(&age, 40)?;
//! let older = query.count()?;
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod executor;
pub mod index;
pub mod observability;
pub mod query;
pub mod schema;
pub mod storage;
pub mod store;

pub use config::StoreConfig;
pub use entity::{Entity, EntityCodec, JsonCodec, Value};
pub use error::{Error, Result};
pub use query::{ExplainPlan, Literal, OrderFlags, Query, QueryBuilder, StringOrder};
pub use schema::{EntitySchema, Model, PropertyDescriptor, ValueType};
pub use store::{EntityBox, Store};
