//! Store configuration
//!
//! A store is either purely in-memory (`data_dir` unset) or persisted to an
//! append-only record log under `<data_dir>/data/records.dat`.
//!
//! Configuration can be built in code or read from a JSON document; every
//! field is optional in JSON and falls back to its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::observability::Severity;

/// Default number of entities decoded per materialization batch.
pub const DEFAULT_MATERIALIZE_BATCH: usize = 256;

/// Configuration for opening a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory for the record log. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Whether each commit is fsynced before it becomes visible.
    pub sync_on_commit: bool,
    /// Upper bound on entities decoded and held per materialization chunk.
    pub materialize_batch: usize,
    /// Minimum severity written by the logger.
    pub log_level: Severity,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sync_on_commit: true,
            materialize_batch: DEFAULT_MATERIALIZE_BATCH,
            log_level: Severity::Warn,
        }
    }
}

impl StoreConfig {
    /// In-memory store with default settings.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Persistent store rooted at `data_dir`.
    pub fn persistent(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    pub fn with_sync_on_commit(mut self, sync: bool) -> Self {
        self.sync_on_commit = sync;
        self
    }

    pub fn with_materialize_batch(mut self, batch: usize) -> Self {
        self.materialize_batch = batch;
        self
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = level;
        self
    }

    /// Returns true if no record log is kept.
    pub fn is_in_memory(&self) -> bool {
        self.data_dir.is_none()
    }

    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Rejects settings the store cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.materialize_batch == 0 {
            return Err(Error::Config(
                "materialize_batch must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_in_memory() {
        let config = StoreConfig::default();
        assert!(config.is_in_memory());
        assert!(config.sync_on_commit);
        assert_eq!(config.materialize_batch, DEFAULT_MATERIALIZE_BATCH);
        assert_eq!(config.log_level, Severity::Warn);
    }

    #[test]
    fn test_persistent() {
        let config = StoreConfig::persistent("/tmp/box").with_sync_on_commit(false);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/box")));
        assert!(!config.sync_on_commit);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            StoreConfig::from_json_str(r#"{"materialize_batch": 64, "log_level": "TRACE"}"#)
                .unwrap();
        assert_eq!(config.materialize_batch, 64);
        assert_eq!(config.log_level, Severity::Trace);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_zero_batch_rejected() {
        let err = StoreConfig::from_json_str(r#"{"materialize_batch": 0}"#).unwrap_err();
        assert_eq!(err.code(), "BOX_CONFIG_INVALID");
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(StoreConfig::from_json_str("{not json").is_err());
    }
}
