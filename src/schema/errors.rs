//! Schema error types
//!
//! Error codes:
//! - BOX_SCHEMA_INVALID (REJECT)
//! - BOX_UNKNOWN_ENTITY (REJECT)
//! - BOX_UNKNOWN_PROPERTY (REJECT)
//! - BOX_ENTITY_VALIDATION_FAILED (REJECT)

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Model definition is malformed or inconsistent
    SchemaInvalid,
    /// Entity name or id not registered in the model
    UnknownEntity,
    /// Property name not declared on the entity
    UnknownProperty,
    /// Entity instance does not match its schema
    ValidationFailed,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SchemaInvalid => "BOX_SCHEMA_INVALID",
            SchemaErrorCode::UnknownEntity => "BOX_UNKNOWN_ENTITY",
            SchemaErrorCode::UnknownProperty => "BOX_UNKNOWN_PROPERTY",
            SchemaErrorCode::ValidationFailed => "BOX_ENTITY_VALIDATION_FAILED",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error with context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
}

impl SchemaError {
    pub fn schema_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::SchemaInvalid,
            message: reason.into(),
        }
    }

    pub fn unknown_entity(entity: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::UnknownEntity,
            message: format!("Entity '{}' is not part of the model", entity),
        }
    }

    pub fn unknown_property(entity: &str, property: &str) -> Self {
        Self {
            code: SchemaErrorCode::UnknownProperty,
            message: format!("Entity '{}' has no property '{}'", entity, property),
        }
    }

    pub fn validation_failed(entity: &str, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::ValidationFailed,
            message: format!("{}: {}", entity, reason.into()),
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
