//! Record log frame format
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, whole frame incl. length and checksum)
//! +------------------+
//! | Op               | (u8: 1 = put, 2 = delete, 3 = clear, 4 = commit)
//! +------------------+
//! | Entity ID        | (u32 LE)
//! +------------------+
//! | Key              | (u64 LE; commit sequence for commit frames)
//! +------------------+
//! | Index Entries    | (u32 LE count, then property id + tagged key each)
//! +------------------+
//! | Body             | (length-prefixed bytes, empty unless put)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself. A write
//! transaction is a run of frames terminated by one commit frame.

use std::io::{self, Cursor, Read};

use crate::index::{IndexEntry, IndexKey};

use super::checksum::compute_checksum;

/// Smallest valid frame: header, empty entry list, empty body, checksum
pub(crate) const MIN_FRAME_SIZE: usize = 4 + 1 + 4 + 8 + 4 + 4 + 4;

/// Frame operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOp {
    Put,
    Delete,
    /// Deletes every record of one entity
    Clear,
    /// Ends a transaction; preceding frames become visible
    Commit,
}

impl LogOp {
    fn to_byte(self) -> u8 {
        match self {
            LogOp::Put => 1,
            LogOp::Delete => 2,
            LogOp::Clear => 3,
            LogOp::Commit => 4,
        }
    }

    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(LogOp::Put),
            2 => Some(LogOp::Delete),
            3 => Some(LogOp::Clear),
            4 => Some(LogOp::Commit),
            _ => None,
        }
    }
}

/// One frame of the record log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub op: LogOp,
    pub entity_id: u32,
    pub key: u64,
    pub index_entries: Vec<IndexEntry>,
    pub body: Vec<u8>,
}

impl LogRecord {
    pub fn put(entity_id: u32, key: u64, index_entries: Vec<IndexEntry>, body: Vec<u8>) -> Self {
        Self {
            op: LogOp::Put,
            entity_id,
            key,
            index_entries,
            body,
        }
    }

    pub fn delete(entity_id: u32, key: u64) -> Self {
        Self {
            op: LogOp::Delete,
            entity_id,
            key,
            index_entries: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn clear(entity_id: u32) -> Self {
        Self {
            op: LogOp::Clear,
            entity_id,
            key: 0,
            index_entries: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn commit(sequence: u64) -> Self {
        Self {
            op: LogOp::Commit,
            entity_id: 0,
            key: sequence,
            index_entries: Vec::new(),
            body: Vec::new(),
        }
    }

    fn serialize_body(&self, buf: &mut Vec<u8>) {
        buf.push(self.op.to_byte());
        buf.extend_from_slice(&self.entity_id.to_le_bytes());
        buf.extend_from_slice(&self.key.to_le_bytes());

        buf.extend_from_slice(&(self.index_entries.len() as u32).to_le_bytes());
        for (property_id, key) in &self.index_entries {
            buf.extend_from_slice(&property_id.to_le_bytes());
            write_index_key(buf, key);
        }

        buf.extend_from_slice(&(self.body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.body);
    }

    /// Serializes the complete frame
    pub fn serialize(&self) -> Vec<u8> {
        let mut frame = vec![0u8; 4];
        self.serialize_body(&mut frame);

        let frame_length = (frame.len() + 4) as u32;
        frame[0..4].copy_from_slice(&frame_length.to_le_bytes());

        let checksum = compute_checksum(&frame);
        frame.extend_from_slice(&checksum.to_le_bytes());
        frame
    }

    /// Parses one frame, verifying its checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_FRAME_SIZE {
            return Err(invalid(io::ErrorKind::UnexpectedEof, "Frame too short".into()));
        }

        let frame_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if frame_length < MIN_FRAME_SIZE {
            return Err(invalid(
                io::ErrorKind::InvalidData,
                format!("Invalid frame length: {}", frame_length),
            ));
        }
        if data.len() < frame_length {
            return Err(invalid(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Frame truncated: expected {} bytes, got {}",
                    frame_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = frame_length - 4;
        let mut stored = [0u8; 4];
        stored.copy_from_slice(&data[checksum_offset..frame_length]);
        let stored = u32::from_le_bytes(stored);
        let computed = compute_checksum(&data[..checksum_offset]);
        if computed != stored {
            return Err(invalid(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed, stored
                ),
            ));
        }

        let mut cursor = Cursor::new(&data[4..checksum_offset]);

        let op_byte = read_u8(&mut cursor)?;
        let op = LogOp::from_byte(op_byte).ok_or_else(|| {
            invalid(io::ErrorKind::InvalidData, format!("Unknown op {}", op_byte))
        })?;
        let entity_id = read_u32(&mut cursor)?;
        let key = read_u64(&mut cursor)?;

        let entry_count = read_u32(&mut cursor)? as usize;
        let mut index_entries = Vec::with_capacity(entry_count.min(64));
        for _ in 0..entry_count {
            let property_id = read_u32(&mut cursor)?;
            index_entries.push((property_id, read_index_key(&mut cursor)?));
        }

        let body = read_bytes(&mut cursor)?;

        if cursor.position() as usize != checksum_offset - 4 {
            return Err(invalid(
                io::ErrorKind::InvalidData,
                "Trailing bytes inside frame".into(),
            ));
        }

        Ok((
            Self {
                op,
                entity_id,
                key,
                index_entries,
                body,
            },
            frame_length,
        ))
    }
}

fn invalid(kind: io::ErrorKind, message: String) -> io::Error {
    io::Error::new(kind, message)
}

fn write_index_key(buf: &mut Vec<u8>, key: &IndexKey) {
    match key {
        IndexKey::Bool(b) => {
            buf.push(0);
            buf.push(u8::from(*b));
        }
        IndexKey::Int(v) => {
            buf.push(1);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        IndexKey::Float(bits) => {
            buf.push(2);
            buf.extend_from_slice(&bits.to_le_bytes());
        }
        IndexKey::String(s) => {
            buf.push(3);
            buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
            buf.extend_from_slice(s.as_bytes());
        }
    }
}

fn read_index_key<R: Read>(reader: &mut R) -> io::Result<IndexKey> {
    match read_u8(reader)? {
        0 => Ok(IndexKey::Bool(read_u8(reader)? != 0)),
        1 => Ok(IndexKey::Int(read_u64(reader)? as i64)),
        2 => Ok(IndexKey::Float(read_u64(reader)?)),
        3 => {
            let bytes = read_bytes(reader)?;
            String::from_utf8(bytes)
                .map(IndexKey::String)
                .map_err(|e| invalid(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e)))
        }
        tag => Err(invalid(
            io::ErrorKind::InvalidData,
            format!("Unknown index key tag {}", tag),
        )),
    }
}

fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    let mut buf = Vec::new();
    reader.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(invalid(
            io::ErrorKind::UnexpectedEof,
            format!("Length prefix {} exceeds frame", len),
        ));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogRecord {
        LogRecord::put(
            1,
            42,
            vec![
                (4, IndexKey::from_int(2007)),
                (8, IndexKey::from_string("banana")),
                (6, IndexKey::from_float(20000.7)),
            ],
            br#"[{"i":2007}]"#.to_vec(),
        )
    }

    #[test]
    fn test_put_frame_roundtrip() {
        let record = sample();
        let bytes = record.serialize();
        let (parsed, consumed) = LogRecord::deserialize(&bytes).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_commit_frame_is_minimal() {
        let bytes = LogRecord::commit(7).serialize();
        assert_eq!(bytes.len(), MIN_FRAME_SIZE);
        let (parsed, _) = LogRecord::deserialize(&bytes).unwrap();
        assert_eq!(parsed.op, LogOp::Commit);
        assert_eq!(parsed.key, 7);
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut bytes = sample().serialize();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        let err = LogRecord::deserialize(&bytes).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_truncated_frame() {
        let bytes = sample().serialize();
        let err = LogRecord::deserialize(&bytes[..bytes.len() - 3]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
