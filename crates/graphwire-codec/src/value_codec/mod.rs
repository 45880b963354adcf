//! Value graph serialization and deserialization.
//!
//! Encodes arbitrary value graphs into a compact, self-describing byte
//! stream and back, preserving shared substructure and cycles through
//! back-references.
//!
//! # Module Organization
//!
//! - [`encoder`] - Depth-first graph encoding to the tagged binary format
//! - [`decoder`] - Recursive-descent decoding with bounded error propagation
//! - [`checksum`] - CRC32 checksum utilities for payload integrity
//! - [`compression`] - Payload compression/decompression (Zlib, LZ4)

pub mod checksum;
pub mod compression;
pub mod decoder;
pub mod encoder;

#[cfg(test)]
mod tests;

pub use decoder::ValueDecoder;
pub use encoder::ValueEncoder;

pub use checksum::{append_checksum, append_checksum_in_place, validate_and_strip_checksum};
pub use compression::{compress, decompress};

use std::io;

use graphwire_core::{config::CodecConfig, error::CodecResult};

use crate::value::Value;

/// Encodes a value graph with the default configuration.
pub fn encode(value: &Value) -> CodecResult<Vec<u8>> {
    encode_with(value, &CodecConfig::default())
}

/// Encodes a value graph, honoring the configured recursion bound.
pub fn encode_with(value: &Value, config: &CodecConfig) -> CodecResult<Vec<u8>> {
    ValueEncoder::new(config).encode(value)
}

/// Decodes one complete payload with the default configuration.
pub fn decode(bytes: &[u8]) -> CodecResult<Value> {
    decode_with(bytes, &CodecConfig::default())
}

/// Decodes one complete payload, honoring the configured resource bounds.
///
/// The payload is decoded whole; trailing bytes after the top-level value
/// are an error.
pub fn decode_with(bytes: &[u8], config: &CodecConfig) -> CodecResult<Value> {
    ValueDecoder::new(bytes, config).decode()
}

/// Encodes a value graph and applies the configured payload transforms:
/// compression first, then the trailing checksum if enabled.
///
/// The result is what [`decode_payload`] expects under the same
/// configuration.
pub fn encode_payload(value: &Value, config: &CodecConfig) -> io::Result<Vec<u8>> {
    let encoded = encode_with(value, config)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut payload =
        compression::compress(&encoded, config.compression, config.compression_threshold)?;
    if config.use_checksums {
        checksum::append_checksum_in_place(&mut payload);
    }
    Ok(payload)
}

/// Undoes [`encode_payload`]: validates and strips the checksum if enabled,
/// decompresses, then decodes the value graph.
pub fn decode_payload(bytes: &[u8], config: &CodecConfig) -> io::Result<Value> {
    let bytes = if config.use_checksums {
        checksum::validate_and_strip_checksum(bytes)?
    } else {
        bytes
    };
    let decompressed = compression::decompress(bytes)?;
    decode_with(&decompressed, config).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
