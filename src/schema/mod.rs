//! Schema subsystem
//!
//! Entity and property descriptors, the model registry, and write-time
//! validation of entity instances.
//!
//! # Design Principles
//!
//! - Descriptors are immutable once registered
//! - Validation before storage, never after
//! - No implicit type coercion

mod errors;
mod model;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use model::{Model, ModelDef};
pub use types::{EntityDef, EntitySchema, PropertyDef, PropertyDescriptor, ValueType};
pub use validator::EntityValidator;
