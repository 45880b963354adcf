//! Payload compression and decompression.
//!
//! The compressor is a byte-to-byte transform applied to a complete encoded
//! payload, never inside the codec's recursive descent. Its output carries a
//! 1-byte identity header so the receiving side knows which transform to
//! undo: `[algorithm_id][data]`, with 0 = stored, 1 = zlib, 2 = lz4. The
//! stored form is also used whenever compression is disabled, the payload is
//! below the threshold, or compressing would not shrink it.

use std::io::{self, Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};

use graphwire_core::config::CompressionAlgorithm;

const MARKER_STORED: u8 = 0;
const MARKER_ZLIB: u8 = 1;
const MARKER_LZ4: u8 = 2;

/// Compresses an encoded payload, tagging the output with the algorithm
/// identity. Round-trips exactly through [`decompress`].
pub fn compress(
    payload: &[u8],
    algorithm: CompressionAlgorithm,
    threshold: usize,
) -> io::Result<Vec<u8>> {
    if payload.len() < threshold {
        return Ok(stored(payload));
    }

    match algorithm {
        CompressionAlgorithm::None => Ok(stored(payload)),
        CompressionAlgorithm::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(payload)?;
            let compressed = encoder.finish()?;
            if compressed.len() < payload.len() {
                let mut out = Vec::with_capacity(compressed.len() + 1);
                out.push(MARKER_ZLIB);
                out.extend_from_slice(&compressed);
                Ok(out)
            } else {
                Ok(stored(payload))
            }
        }
        CompressionAlgorithm::Lz4 => {
            let compressed = lz4::block::compress(payload, None, false)?;
            // The lz4 frame stores the original length so the block
            // decompressor can size its output.
            if compressed.len() + 4 < payload.len() {
                let mut out = Vec::with_capacity(compressed.len() + 5);
                out.push(MARKER_LZ4);
                out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
                out.extend_from_slice(&compressed);
                Ok(out)
            } else {
                Ok(stored(payload))
            }
        }
    }
}

/// Undoes [`compress`] based on the identity header.
pub fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let (&marker, body) = data
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "empty compressed payload"))?;

    match marker {
        MARKER_STORED => Ok(body.to_vec()),
        MARKER_ZLIB => {
            let mut decoder = ZlibDecoder::new(body);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            Ok(out)
        }
        MARKER_LZ4 => {
            if body.len() < 4 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "lz4 payload missing original length",
                ));
            }
            let original_len = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
            lz4::block::decompress(&body[4..], Some(original_len as i32))
        }
        unknown => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown compression marker: {}", unknown),
        )),
    }
}

fn stored(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 1);
    out.push(MARKER_STORED);
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_round_trip() {
        let payload = b"short payload";
        let framed = compress(payload, CompressionAlgorithm::None, 0).unwrap();
        assert_eq!(framed[0], MARKER_STORED);
        assert_eq!(decompress(&framed).unwrap(), payload);
    }

    #[test]
    fn test_zlib_round_trip() {
        let payload = vec![0x42; 512];
        let framed = compress(&payload, CompressionAlgorithm::Zlib, 128).unwrap();
        assert_eq!(framed[0], MARKER_ZLIB);
        assert!(framed.len() < payload.len());
        assert_eq!(decompress(&framed).unwrap(), payload);
    }

    #[test]
    fn test_lz4_round_trip() {
        let payload = vec![0x17; 512];
        let framed = compress(&payload, CompressionAlgorithm::Lz4, 128).unwrap();
        assert_eq!(framed[0], MARKER_LZ4);
        assert!(framed.len() < payload.len());
        assert_eq!(decompress(&framed).unwrap(), payload);
    }

    #[test]
    fn test_below_threshold_stays_stored() {
        let payload = b"tiny";
        let framed = compress(payload, CompressionAlgorithm::Zlib, 128).unwrap();
        assert_eq!(framed[0], MARKER_STORED);
        assert_eq!(decompress(&framed).unwrap(), payload);
    }

    #[test]
    fn test_incompressible_falls_back_to_stored() {
        let payload: Vec<u8> = (0..=255).collect();
        let framed = compress(&payload, CompressionAlgorithm::Zlib, 16).unwrap();
        assert_eq!(decompress(&framed).unwrap(), payload);
    }

    #[test]
    fn test_unknown_marker_rejected() {
        assert!(decompress(&[99, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(decompress(&[]).is_err());
    }
}
