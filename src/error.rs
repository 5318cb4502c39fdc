//! Crate-level error type
//!
//! Each subsystem owns a coded error (`QueryError`, `StorageError`,
//! `SchemaError`). Public entry points return [`Error`], which wraps them
//! without losing the code or severity.

use thiserror::Error;

use crate::query::QueryError;
use crate::schema::SchemaError;
use crate::storage::StorageError;

/// Unified error returned by the public API
#[derive(Debug, Error)]
pub enum Error {
    /// Query construction, rebinding or execution failed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Record store failure (I/O, corruption, commit)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Model or entity validation failure
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Store configuration rejected at open
    #[error("[REJECT] BOX_CONFIG_INVALID: {0}")]
    Config(String),
}

impl Error {
    /// Returns the stable string code of the underlying error
    pub fn code(&self) -> &'static str {
        match self {
            Error::Query(e) => e.code().code(),
            Error::Storage(e) => e.code().code(),
            Error::Schema(e) => e.code().code(),
            Error::Config(_) => "BOX_CONFIG_INVALID",
        }
    }

    /// Returns whether the store must stop serving after this error
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Storage(e) => e.is_fatal(),
            _ => false,
        }
    }

    /// Returns the query error, if this is one
    pub fn as_query(&self) -> Option<&QueryError> {
        match self {
            Error::Query(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for the public API
pub type Result<T> = std::result::Result<T, Error>;
