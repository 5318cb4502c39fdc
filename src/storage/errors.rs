//! Record store errors
//!
//! Error codes:
//! - BOX_LOG_IO (ERROR): the record log could not be opened, read,
//!   appended to, synced or truncated
//! - BOX_ENCODE_FAILED (ERROR): an entity could not be turned into a body
//! - BOX_DATA_CORRUPTION (FATAL): a frame or a stored body is damaged

use std::fmt;
use std::io;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, store stays usable
    Error,
    /// Store contents cannot be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    LogIo,
    EncodeFailed,
    DataCorruption,
}

impl StorageErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::LogIo => "BOX_LOG_IO",
            StorageErrorCode::EncodeFailed => "BOX_ENCODE_FAILED",
            StorageErrorCode::DataCorruption => "BOX_DATA_CORRUPTION",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::DataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Where damaged data was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Byte offset of a frame in the record log
    LogOffset(u64),
    /// Record key whose body is damaged
    RecordKey(u64),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::LogOffset(offset) => write!(f, "log offset {}", offset),
            Location::RecordKey(key) => write!(f, "record {}", key),
        }
    }
}

#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    location: Option<Location>,
    source: Option<io::Error>,
}

impl StorageError {
    /// The record log could not be accessed; `action` names what was tried
    pub fn log_io(action: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::LogIo,
            message: format!("record log: {}", action.into()),
            location: None,
            source: Some(source),
        }
    }

    pub fn encode_failed(reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::EncodeFailed,
            message: reason.into(),
            location: None,
            source: None,
        }
    }

    /// A log frame failed its length or checksum checks
    pub fn corrupt_frame(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::DataCorruption,
            message: reason.into(),
            location: Some(Location::LogOffset(offset)),
            source: None,
        }
    }

    /// The body under `key` is missing or cannot be decoded
    pub fn corrupt_body(key: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::DataCorruption,
            message: reason.into(),
            location: Some(Location::RecordKey(key)),
            source: None,
        }
    }

    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Returns whether the store's contents can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)?;
        if let Some(location) = self.location {
            write!(f, " (at {})", location)?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_corruption_is_fatal() {
        assert!(StorageError::corrupt_frame(0, "checksum mismatch").is_fatal());
        assert!(StorageError::corrupt_body(3, "not json").is_fatal());
        assert!(!StorageError::encode_failed("unsupported value").is_fatal());

        let disk_full = io::Error::new(io::ErrorKind::Other, "disk full");
        let err = StorageError::log_io("append 2 frames", disk_full);
        assert!(!err.is_fatal());
        assert_eq!(err.code().code(), "BOX_LOG_IO");
    }

    #[test]
    fn test_display_names_location_and_cause() {
        let err = StorageError::corrupt_frame(1024, "checksum mismatch");
        assert_eq!(
            err.to_string(),
            "[FATAL] BOX_DATA_CORRUPTION: checksum mismatch (at log offset 1024)"
        );
        assert_eq!(err.location(), Some(Location::LogOffset(1024)));

        let gone = io::Error::new(io::ErrorKind::Other, "device gone");
        let err = StorageError::log_io("sync", gone);
        assert_eq!(err.to_string(), "[ERROR] BOX_LOG_IO: record log: sync: device gone");
    }
}
