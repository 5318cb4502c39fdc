//! Property and entity descriptors
//!
//! Supported value types:
//! - bool
//! - byte, short, int, long: signed integers of 8/16/32/64 bits
//! - float, double: IEEE-754 32/64 bits
//! - string: UTF-8

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};

/// Declared type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
}

impl ValueType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Byte => "byte",
            ValueType::Short => "short",
            ValueType::Int => "int",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::String => "string",
        }
    }

    /// Byte, short, int or long
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ValueType::Byte | ValueType::Short | ValueType::Int | ValueType::Long
        )
    }

    /// Float or double
    pub fn is_floating(&self) -> bool {
        matches!(self, ValueType::Float | ValueType::Double)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating()
    }
}

/// A typed property of one entity.
///
/// Descriptors are created once when the model is registered and shared
/// read-only by every query referencing the property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyDescriptor {
    /// Owning entity id
    pub entity_id: u32,
    /// Property id, unique within the entity
    pub id: u32,
    /// Property name, unique within the entity
    pub name: String,
    /// Declared value type
    pub value_type: ValueType,
    /// Whether the store keeps an ordered index for this property
    pub indexed: bool,
    /// Slot position inside an entity's value vector
    pub ordinal: usize,
}

/// Property definition as it appears in a model document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub indexed: bool,
}

impl PropertyDef {
    pub fn new(id: u32, name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id,
            name: name.into(),
            value_type,
            indexed: false,
        }
    }

    /// Marks the property as indexed
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

/// Entity definition as it appears in a model document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    pub id: u32,
    pub name: String,
    pub properties: Vec<PropertyDef>,
}

/// Validated, immutable description of one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    id: u32,
    name: String,
    properties: Vec<PropertyDescriptor>,
}

impl EntitySchema {
    /// Builds a schema from its definition.
    ///
    /// Rejects a zero entity or property id, an empty name, an entity
    /// without properties, and duplicate property ids or names.
    pub fn from_def(def: EntityDef) -> SchemaResult<Self> {
        if def.id == 0 {
            return Err(SchemaError::schema_invalid("entity id must be non-zero"));
        }
        if def.name.is_empty() {
            return Err(SchemaError::schema_invalid("entity name must not be empty"));
        }
        if def.properties.is_empty() {
            return Err(SchemaError::schema_invalid(format!(
                "entity '{}' declares no properties",
                def.name
            )));
        }

        let mut properties: Vec<PropertyDescriptor> = Vec::with_capacity(def.properties.len());
        for (ordinal, prop) in def.properties.into_iter().enumerate() {
            if prop.id == 0 {
                return Err(SchemaError::schema_invalid(format!(
                    "property '{}.{}' has id 0",
                    def.name, prop.name
                )));
            }
            if prop.name.is_empty() {
                return Err(SchemaError::schema_invalid(format!(
                    "property {} of '{}' has no name",
                    prop.id, def.name
                )));
            }
            if properties.iter().any(|p| p.id == prop.id) {
                return Err(SchemaError::schema_invalid(format!(
                    "duplicate property id {} in '{}'",
                    prop.id, def.name
                )));
            }
            if properties.iter().any(|p| p.name == prop.name) {
                return Err(SchemaError::schema_invalid(format!(
                    "duplicate property name '{}' in '{}'",
                    prop.name, def.name
                )));
            }
            properties.push(PropertyDescriptor {
                entity_id: def.id,
                id: prop.id,
                name: prop.name,
                value_type: prop.value_type,
                indexed: prop.indexed,
                ordinal,
            });
        }

        Ok(Self {
            id: def.id,
            name: def.name,
            properties,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Properties in slot order
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_by_id(&self, id: u32) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Like [`property`](Self::property) but fails with `BOX_UNKNOWN_PROPERTY`
    pub fn require_property(&self, name: &str) -> SchemaResult<&PropertyDescriptor> {
        self.property(name)
            .ok_or_else(|| SchemaError::unknown_property(&self.name, name))
    }

    /// Returns true if `property` is one of this entity's descriptors
    pub fn owns(&self, property: &PropertyDescriptor) -> bool {
        property.entity_id == self.id
            && self.properties.get(property.ordinal) == Some(property)
    }

    pub fn indexed_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.indexed)
    }
}
