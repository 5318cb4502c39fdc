//! Model registry
//!
//! A model is the set of entity schemas a store serves. It is registered
//! once at open and never mutated afterwards; queries hold `Arc`s into it.
//!
//! Models can be assembled in code or loaded from a JSON document:
//!
//! ```json
//! {"entities": [{"id": 1, "name": "Note", "properties": [
//!     {"id": 1, "name": "title", "type": "string", "indexed": true}
//! ]}]}
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::types::{EntityDef, EntitySchema};

/// Model document root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDef {
    pub entities: Vec<EntityDef>,
}

/// Registry of entity schemas by name and id
#[derive(Debug, Clone, Default)]
pub struct Model {
    entities: Vec<Arc<EntitySchema>>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers one entity.
    ///
    /// Entity ids and names must be unique within the model.
    pub fn register(&mut self, def: EntityDef) -> SchemaResult<Arc<EntitySchema>> {
        let schema = EntitySchema::from_def(def)?;

        if self.entity_by_id(schema.id()).is_some() {
            return Err(SchemaError::schema_invalid(format!(
                "duplicate entity id {}",
                schema.id()
            )));
        }
        if self.entity(schema.name()).is_some() {
            return Err(SchemaError::schema_invalid(format!(
                "duplicate entity name '{}'",
                schema.name()
            )));
        }

        let schema = Arc::new(schema);
        self.entities.push(Arc::clone(&schema));
        Ok(schema)
    }

    /// Chaining form of [`register`](Self::register)
    pub fn with_entity(mut self, def: EntityDef) -> SchemaResult<Self> {
        self.register(def)?;
        Ok(self)
    }

    pub fn from_def(def: ModelDef) -> SchemaResult<Self> {
        let mut model = Self::new();
        for entity in def.entities {
            model.register(entity)?;
        }
        Ok(model)
    }

    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        let def: ModelDef = serde_json::from_str(json)
            .map_err(|e| SchemaError::schema_invalid(format!("invalid model JSON: {}", e)))?;
        Self::from_def(def)
    }

    /// Reads a model document from disk
    pub fn load_file(path: &Path) -> SchemaResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::schema_invalid(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn entity(&self, name: &str) -> Option<&Arc<EntitySchema>> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn entity_by_id(&self, id: u32) -> Option<&Arc<EntitySchema>> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Like [`entity`](Self::entity) but fails with `BOX_UNKNOWN_ENTITY`
    pub fn require_entity(&self, name: &str) -> SchemaResult<Arc<EntitySchema>> {
        self.entity(name)
            .cloned()
            .ok_or_else(|| SchemaError::unknown_entity(name))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<EntitySchema>> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyDef, ValueType};

    fn def(id: u32, name: &str) -> EntityDef {
        EntityDef {
            id,
            name: name.into(),
            properties: vec![PropertyDef::new(1, "value", ValueType::Long)],
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let model = Model::new()
            .with_entity(def(1, "A"))
            .unwrap()
            .with_entity(def(2, "B"))
            .unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.entity("B").unwrap().id(), 2);
        assert_eq!(model.entity_by_id(1).unwrap().name(), "A");
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let mut model = Model::new();
        model.register(def(1, "A")).unwrap();
        assert!(model.register(def(1, "Other")).is_err());
        assert!(model.register(def(2, "A")).is_err());
    }

    #[test]
    fn test_unknown_entity() {
        let err = Model::new().require_entity("Ghost").unwrap_err();
        assert_eq!(err.code().code(), "BOX_UNKNOWN_ENTITY");
    }

    #[test]
    fn test_from_json() {
        let model = Model::from_json_str(
            r#"{"entities": [{"id": 7, "name": "Note", "properties": [
                {"id": 1, "name": "title", "type": "string", "indexed": true},
                {"id": 2, "name": "stars", "type": "short"}
            ]}]}"#,
        )
        .unwrap();
        let note = model.require_entity("Note").unwrap();
        assert!(note.property("title").unwrap().indexed);
        assert_eq!(note.property("stars").unwrap().value_type, ValueType::Short);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = Model::from_json_str(r#"{"entities": [{"id": 1}]}"#).unwrap_err();
        assert_eq!(err.code().code(), "BOX_SCHEMA_INVALID");
    }
}
