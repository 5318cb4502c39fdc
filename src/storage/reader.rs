//! Record log reader
//!
//! Every frame is checksum-verified as it is read. Any failure is
//! reported as `BOX_DATA_CORRUPTION` with the frame's byte offset.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::errors::{StorageError, StorageResult};
use super::record::{LogRecord, MIN_FRAME_SIZE};

/// Sequential reader over a record log
pub struct LogReader {
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl LogReader {
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = File::open(path).map_err(|e| {
            StorageError::log_io(format!("open {}", path.display()), e)
        })?;
        let file_size = file
            .metadata()
            .map_err(|e| StorageError::log_io("read metadata", e))?
            .len();

        Ok(Self {
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    /// Offset of the next frame
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Reads the next frame, `Ok(None)` at end of file
    pub fn read_next(&mut self) -> StorageResult<Option<LogRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_FRAME_SIZE as u64 {
            return Err(StorageError::corrupt_frame(
                self.current_offset,
                format!(
                    "torn frame: {} bytes left, a frame needs at least {}",
                    remaining, MIN_FRAME_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::corrupt_frame(
                self.current_offset,
                format!("frame length unreadable: {}", e),
            )
        })?;
        let frame_length = u64::from(u32::from_le_bytes(len_buf));

        if frame_length < MIN_FRAME_SIZE as u64 || frame_length > remaining {
            return Err(StorageError::corrupt_frame(
                self.current_offset,
                format!(
                    "frame length {} with {} bytes left",
                    frame_length, remaining
                ),
            ));
        }

        let mut frame = vec![0u8; frame_length as usize];
        frame[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut frame[4..]).map_err(|e| {
            StorageError::corrupt_frame(
                self.current_offset,
                format!("frame unreadable: {}", e),
            )
        })?;

        let (record, consumed) = LogRecord::deserialize(&frame)
            .map_err(|e| StorageError::corrupt_frame(self.current_offset, e.to_string()))?;
        self.current_offset += consumed as u64;

        Ok(Some(record))
    }

    pub fn read_all(&mut self) -> StorageResult<Vec<LogRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}
