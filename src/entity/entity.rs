//! Materialized entity instances

use crate::schema::{EntitySchema, PropertyDescriptor};

use super::value::Value;

/// An entity: a store-assigned key plus one optional value per property.
///
/// `id == 0` marks an entity that has not been stored yet. Instances are
/// plain values; mutating one never touches the store until it is put.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: u64,
    values: Vec<Option<Value>>,
}

impl Entity {
    /// Unsaved entity with every property null
    pub fn new(schema: &EntitySchema) -> Self {
        Self {
            id: 0,
            values: vec![None; schema.properties().len()],
        }
    }

    pub fn from_parts(id: u64, values: Vec<Option<Value>>) -> Self {
        Self { id, values }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    pub fn get(&self, property: &PropertyDescriptor) -> Option<&Value> {
        self.values.get(property.ordinal).and_then(Option::as_ref)
    }

    pub fn get_i64(&self, property: &PropertyDescriptor) -> Option<i64> {
        self.get(property).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, property: &PropertyDescriptor) -> Option<f64> {
        self.get(property).and_then(Value::as_f64)
    }

    pub fn get_str(&self, property: &PropertyDescriptor) -> Option<&str> {
        self.get(property).and_then(Value::as_str)
    }

    /// Sets a property value; `None` makes it null
    pub fn set_value(&mut self, property: &PropertyDescriptor, value: Option<Value>) -> &mut Self {
        if self.values.len() <= property.ordinal {
            self.values.resize(property.ordinal + 1, None);
        }
        self.values[property.ordinal] = value;
        self
    }

    pub fn set(&mut self, property: &PropertyDescriptor, value: impl Into<Value>) -> &mut Self {
        self.set_value(property, Some(value.into()))
    }

    pub fn clear(&mut self, property: &PropertyDescriptor) -> &mut Self {
        self.set_value(property, None)
    }

    /// Consuming form of [`set`](Self::set)
    pub fn with(mut self, property: &PropertyDescriptor, value: impl Into<Value>) -> Self {
        self.set(property, value);
        self
    }

    /// Consuming form of [`set_value`](Self::set_value)
    pub fn with_value(mut self, property: &PropertyDescriptor, value: Option<Value>) -> Self {
        self.set_value(property, value);
        self
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }
}
