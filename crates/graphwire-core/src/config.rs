use std::default::Default;

use crate::constants::{DEFAULT_MAX_BYTES_LEN, DEFAULT_MAX_DEPTH, DEFAULT_MAX_KEYFRAMES};

/// Compression algorithm to apply to an encoded payload.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    /// No compression
    None,
    /// Zlib compression (balanced speed/ratio)
    Zlib,
    /// LZ4 compression (fast, lower ratio)
    Lz4,
}

#[derive(Clone, Debug)]
/// Configuration options to tune codec behavior and resource bounds.
pub struct CodecConfig {
    /// Max recursion depth for encode and decode. Aggregates nested deeper
    /// than this fail with a depth error.
    pub max_depth: usize,
    /// Max length in bytes of a single decoded byte string.
    pub max_bytes_len: usize,
    /// Max keypoint count of a decoded number or color sequence.
    pub max_keyframes: usize,
    /// Return a placeholder table instead of failing when a decoded domain
    /// tuple's fields are rejected by its constructor (default: false).
    pub placeholder_on_domain_error: bool,
    /// Compression algorithm for the payload hook (default: None).
    pub compression: CompressionAlgorithm,
    /// Minimum payload size to compress in bytes (default: 128). Payloads smaller than this won't be compressed.
    pub compression_threshold: usize,
    /// Append a CRC32 checksum to framed payloads (default: false).
    pub use_checksums: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes_len: DEFAULT_MAX_BYTES_LEN,
            max_keyframes: DEFAULT_MAX_KEYFRAMES,
            placeholder_on_domain_error: false, // Strict by default
            compression: CompressionAlgorithm::None, // Disabled by default
            compression_threshold: 128, // Don't compress payloads smaller than 128 bytes
            use_checksums: false,
        }
    }
}
