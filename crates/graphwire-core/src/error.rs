//! Error types for encode and decode failures.
//!
//! Every variant that corresponds to a position in the stream carries the
//! cursor offset at which the failure was detected. Errors are not wrapped
//! while unwinding a recursive decode, so the offset is always the innermost
//! one.

use std::io;

use thiserror::Error;

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// A single error raised by a top-level encode or decode call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A read ran past the end of the payload.
    #[error("unexpected end of payload at offset {offset}")]
    Truncated {
        /// Offset at which the read was attempted.
        offset: usize,
    },

    /// An unknown or unexpected byte where a frame byte was required.
    #[error("unexpected byte {found:#04x} at offset {offset}, expected {expected}")]
    TagMismatch {
        /// The byte actually read.
        found: u8,
        /// Offset of the offending byte.
        offset: usize,
        /// What the decoder was expecting at this position.
        expected: &'static str,
    },

    /// The key-value separator was absent inside a mapping frame.
    #[error("missing key-value separator at offset {offset}, found {found:#04x}")]
    MissingSeparator {
        /// The byte read in place of the separator.
        found: u8,
        /// Offset of the offending byte.
        offset: usize,
    },

    /// A back-reference named an identifier not yet in the registry.
    #[error("reference to unregistered aggregate {id} at offset {offset}")]
    DanglingReference {
        /// The identifier carried by the reference frame.
        id: i64,
        /// Offset of the reference frame.
        offset: usize,
    },

    /// Recursive descent exceeded the configured depth bound.
    #[error("nesting deeper than {limit} at offset {offset}")]
    DepthLimit {
        /// The configured bound.
        limit: usize,
        /// Stream offset (decode) or bytes emitted so far (encode).
        offset: usize,
    },

    /// A declared length exceeded the configured bound.
    #[error("{what} length {len} outside limit {limit} at offset {offset}")]
    SizeLimit {
        /// Which length was out of bounds ("byte string", "keyframe list").
        what: &'static str,
        /// The declared length, signed so that a nonsensical negative
        /// declared count is reported as read.
        len: i64,
        /// The configured bound.
        limit: usize,
        /// Offset of the length field.
        offset: usize,
    },

    /// A decoded domain tuple's fields were rejected by its constructor.
    ///
    /// Raised only when placeholder decoding is not enabled; otherwise the
    /// decoder substitutes a placeholder table and continues.
    #[error("cannot reconstruct {kind} at offset {offset}: {reason}")]
    DomainReconstruction {
        /// The rejected kind ("BrickColor", "Enum", ...).
        kind: &'static str,
        /// Why the constructor rejected the fields.
        reason: &'static str,
        /// Offset of the tuple's tag byte.
        offset: usize,
    },

    /// Bytes remained after the top-level value was decoded.
    #[error("{remaining} trailing bytes after payload at offset {offset}")]
    TrailingBytes {
        /// Number of undecoded bytes.
        remaining: usize,
        /// Offset of the first trailing byte.
        offset: usize,
    },

    /// The output sink rejected a write while encoding. Cannot occur for the
    /// in-memory buffer the encoder writes to.
    #[error("write to output buffer failed: {kind:?}")]
    Write {
        /// The I/O error kind reported by the sink.
        kind: io::ErrorKind,
    },
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        CodecError::Write { kind: err.kind() }
    }
}

impl CodecError {
    /// The stream offset the error was detected at, where one exists.
    pub fn offset(&self) -> Option<usize> {
        match self {
            CodecError::Truncated { offset }
            | CodecError::TagMismatch { offset, .. }
            | CodecError::MissingSeparator { offset, .. }
            | CodecError::DanglingReference { offset, .. }
            | CodecError::DepthLimit { offset, .. }
            | CodecError::SizeLimit { offset, .. }
            | CodecError::DomainReconstruction { offset, .. }
            | CodecError::TrailingBytes { offset, .. } => Some(*offset),
            CodecError::Write { .. } => None,
        }
    }
}
