//! Entity validation against its schema
//!
//! Validation runs before any write reaches storage:
//! - the entity carries exactly one slot per declared property
//! - every non-null slot holds the declared type, with no coercion
//!
//! Null is always accepted. The validator never mutates the entity.

use crate::entity::Entity;

use super::errors::{SchemaError, SchemaResult};
use super::types::EntitySchema;

/// Stateless validator for entity instances
pub struct EntityValidator;

impl EntityValidator {
    pub fn validate(schema: &EntitySchema, entity: &Entity) -> SchemaResult<()> {
        let values = entity.values();
        if values.len() != schema.properties().len() {
            return Err(SchemaError::validation_failed(
                schema.name(),
                format!(
                    "expected {} property slots, found {}",
                    schema.properties().len(),
                    values.len()
                ),
            ));
        }

        for (property, slot) in schema.properties().iter().zip(values) {
            let Some(value) = slot else { continue };
            if value.value_type() != property.value_type {
                return Err(SchemaError::validation_failed(
                    schema.name(),
                    format!(
                        "property '{}' expects {}, got {}",
                        property.name,
                        property.value_type.type_name(),
                        value.value_type().type_name()
                    ),
                ));
            }
        }

        Ok(())
    }
}
