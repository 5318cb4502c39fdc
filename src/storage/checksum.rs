//! CRC32 checksums for record log frames
//!
//! Every frame read back from disk is verified; a mismatch during replay
//! aborts the open.

use crc32fast::Hasher;

/// CRC32 (IEEE) over `data`
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
