//! Record log writer
//!
//! Transactions are appended as one contiguous batch ending in a commit
//! frame. A failed append is cut back off the file so a later batch never
//! follows a half-written one.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::LogRecord;

/// Log file location under a data directory
pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("data").join("records.dat")
}

/// Append-only writer for `<data_dir>/data/records.dat`
pub struct LogWriter {
    path: PathBuf,
    file: File,
    current_offset: u64,
}

impl LogWriter {
    /// Opens or creates the log, creating parent directories as needed.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let path = log_path(data_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::log_io(format!("create directory {}", parent.display()), e)
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                StorageError::log_io(format!("open {}", path.display()), e)
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::log_io("read metadata", e))?
            .len();

        Ok(Self {
            path,
            file,
            current_offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends a batch of frames, optionally followed by fsync.
    ///
    /// Returns the offset of the first frame. On failure the file is
    /// truncated back to its previous length.
    pub fn append_batch(&mut self, records: &[LogRecord], sync: bool) -> StorageResult<u64> {
        let start = self.current_offset;
        let mut buf = Vec::new();
        for record in records {
            buf.extend_from_slice(&record.serialize());
        }

        let written = self.file.write_all(&buf).and_then(|_| {
            if sync {
                self.file.sync_data()
            } else {
                Ok(())
            }
        });

        if let Err(e) = written {
            // best effort; if this fails too the next open reports corruption
            let _ = self.file.set_len(start);
            return Err(StorageError::log_io(format!("append {} frames", records.len()), e));
        }

        self.current_offset += buf.len() as u64;
        Ok(start)
    }

    /// Drops everything after `offset`
    pub fn truncate_to(&mut self, offset: u64) -> StorageResult<()> {
        self.file
            .set_len(offset)
            .and_then(|_| self.file.sync_data())
            .map_err(|e| {
                StorageError::log_io(format!("truncate to {}", offset), e)
            })?;
        self.current_offset = offset;
        Ok(())
    }
}
