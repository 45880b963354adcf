//! CRC32 checksum utilities for payload integrity.
//!
//! Checksums sit outside the codec frames: the four big-endian CRC32 bytes
//! are appended after the complete (possibly compressed) payload and must be
//! validated and stripped before handing the bytes to the decoder.

use std::io;

use crc32fast::Hasher;

fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Returns the payload with its CRC32 appended big-endian.
pub fn append_checksum(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.extend_from_slice(payload);
    out.extend_from_slice(&crc32(payload).to_be_bytes());
    out
}

/// Appends the CRC32 to the buffer in place.
pub fn append_checksum_in_place(payload: &mut Vec<u8>) {
    let checksum = crc32(payload);
    payload.extend_from_slice(&checksum.to_be_bytes());
}

/// Validates the trailing CRC32 and returns the payload without it.
pub fn validate_and_strip_checksum(data: &[u8]) -> io::Result<&[u8]> {
    if data.len() < 4 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "payload too short for checksum"));
    }

    let (payload, checksum_bytes) = data.split_at(data.len() - 4);
    let received = u32::from_be_bytes([
        checksum_bytes[0],
        checksum_bytes[1],
        checksum_bytes[2],
        checksum_bytes[3],
    ]);
    let computed = crc32(payload);

    if received != computed {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("checksum mismatch: expected {}, got {}", computed, received),
        ));
    }

    Ok(payload)
}
