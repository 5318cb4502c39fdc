//! Entity body encoding
//!
//! Storage keeps opaque bytes per key; the codec turns an entity's value
//! slots into those bytes and back. The key itself is not part of the
//! body, it is restored from the record on decode.

use serde::{Deserialize, Serialize};

use crate::storage::{StorageError, StorageResult};

use super::entity::Entity;
use super::value::Value;

/// Converts entities to and from stored record bodies
pub trait EntityCodec: Send + Sync {
    fn encode(&self, entity: &Entity) -> StorageResult<Vec<u8>>;

    /// Decodes the body stored under `key`.
    ///
    /// A body that cannot be decoded is corruption.
    fn decode(&self, key: u64, bytes: &[u8]) -> StorageResult<Entity>;
}

/// JSON array of tagged slots.
///
/// Floats are written as their IEEE bit patterns so NaN and infinities
/// survive the round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[derive(Serialize, Deserialize)]
enum Slot {
    #[serde(rename = "z")]
    Bool(bool),
    #[serde(rename = "b")]
    Byte(i8),
    #[serde(rename = "s")]
    Short(i16),
    #[serde(rename = "i")]
    Int(i32),
    #[serde(rename = "l")]
    Long(i64),
    #[serde(rename = "f")]
    Float(u32),
    #[serde(rename = "d")]
    Double(u64),
    #[serde(rename = "t")]
    String(String),
}

impl From<&Value> for Slot {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(v) => Slot::Bool(*v),
            Value::Byte(v) => Slot::Byte(*v),
            Value::Short(v) => Slot::Short(*v),
            Value::Int(v) => Slot::Int(*v),
            Value::Long(v) => Slot::Long(*v),
            Value::Float(v) => Slot::Float(v.to_bits()),
            Value::Double(v) => Slot::Double(v.to_bits()),
            Value::String(v) => Slot::String(v.clone()),
        }
    }
}

impl From<Slot> for Value {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Bool(v) => Value::Bool(v),
            Slot::Byte(v) => Value::Byte(v),
            Slot::Short(v) => Value::Short(v),
            Slot::Int(v) => Value::Int(v),
            Slot::Long(v) => Value::Long(v),
            Slot::Float(v) => Value::Float(f32::from_bits(v)),
            Slot::Double(v) => Value::Double(f64::from_bits(v)),
            Slot::String(v) => Value::String(v),
        }
    }
}

impl EntityCodec for JsonCodec {
    fn encode(&self, entity: &Entity) -> StorageResult<Vec<u8>> {
        let slots: Vec<Option<Slot>> = entity
            .values()
            .iter()
            .map(|v| v.as_ref().map(Slot::from))
            .collect();
        serde_json::to_vec(&slots).map_err(|e| {
            StorageError::encode_failed(format!("entity {} not encodable: {}", entity.id(), e))
        })
    }

    fn decode(&self, key: u64, bytes: &[u8]) -> StorageResult<Entity> {
        let slots: Vec<Option<Slot>> = serde_json::from_slice(bytes).map_err(|e| {
            StorageError::corrupt_body(key, format!("undecodable entity body: {}", e))
        })?;
        let values = slots.into_iter().map(|s| s.map(Value::from)).collect();
        Ok(Entity::from_parts(key, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_preserves_nulls_and_types() {
        let entity = Entity::from_parts(
            0,
            vec![
                Some(Value::Short(-7)),
                None,
                Some(Value::Float(f32::NAN)),
                Some(Value::String("schrodinger".into())),
            ],
        );
        let bytes = JsonCodec.encode(&entity).unwrap();
        let decoded = JsonCodec.decode(42, &bytes).unwrap();

        assert_eq!(decoded.id(), 42);
        assert_eq!(decoded.values()[0], Some(Value::Short(-7)));
        assert_eq!(decoded.values()[1], None);
        match &decoded.values()[2] {
            Some(Value::Float(f)) => assert!(f.is_nan()),
            other => panic!("unexpected slot {:?}", other),
        }
        assert_eq!(decoded.values()[3], Some(Value::String("schrodinger".into())));
    }

    #[test]
    fn test_garbage_is_corruption() {
        let err = JsonCodec.decode(9, b"{not json").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("key: 9"));
    }
}
