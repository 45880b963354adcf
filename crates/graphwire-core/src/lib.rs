#![warn(missing_docs)]

//! graphwire-core: foundational types for the graphwire codec.
//!
//! This crate provides the minimal set of definitions shared across the
//! workspace:
//! - Wire-format constants (tag bytes, default resource limits)
//! - Configuration types
//! - Error types
//!
//! The codec itself lives in `graphwire-codec`; the `graphwire` crate is a
//! small facade over both.

/// Wire-format constants shared between the encoder and the decoder.
pub mod constants {
    /// The null value.
    pub const TAG_NIL: u8 = 0;
    /// The boolean false.
    pub const TAG_BOOLEAN_FALSE: u8 = 1;
    /// The boolean true.
    pub const TAG_BOOLEAN_TRUE: u8 = 2;
    /// Variable-width signed integer: width byte (1, 2 or 4), then that many
    /// magnitude bytes big-endian, two's complement within the width.
    pub const TAG_NUMBER_INT: u8 = 3;
    /// 8-byte little-endian IEEE-754 binary64.
    pub const TAG_NUMBER_FLOAT: u8 = 4;
    /// Byte string shorter than 255 bytes: 1 length byte, then bytes.
    pub const TAG_STRING_SHORT: u8 = 5;
    /// Byte string of 255 bytes or more: 4 length bytes big-endian, then bytes.
    pub const TAG_STRING_LONG: u8 = 6;
    /// Start of a keyed mapping frame.
    pub const TAG_TABLE_START: u8 = 7;
    /// End of a keyed mapping frame.
    pub const TAG_TABLE_END: u8 = 8;
    /// Start of an ordered sequence frame.
    pub const TAG_ARRAY_START: u8 = 9;
    /// End of an ordered sequence frame.
    pub const TAG_ARRAY_END: u8 = 10;
    /// Required between each mapping key and its value.
    pub const TAG_KEY_VALUE_SEPARATOR: u8 = 11;
    /// Back-reference to a previously visited aggregate: INT-framed identifier.
    pub const TAG_REFERENCE: u8 = 12;
    /// Three binary64 fields: x, y, z.
    pub const TAG_VECTOR3: u8 = 13;
    /// Three binary64 fields: r, g, b.
    pub const TAG_COLOR3: u8 = 14;
    /// Four binary64 fields: x scale, x offset, y scale, y offset.
    pub const TAG_UDIM2: u8 = 15;
    /// Twelve binary64 fields: x, y, z, then nine rotation entries row-major.
    pub const TAG_CFRAME: u8 = 16;
    /// Two binary64 fields: x, y.
    pub const TAG_VECTOR2: u8 = 17;
    /// Four binary64 fields: min x, min y, max x, max y.
    pub const TAG_RECT: u8 = 18;
    /// Two string frames: enum type name, then member name.
    pub const TAG_ENUM: u8 = 19;
    /// One string frame: an opaque instance path.
    pub const TAG_INSTANCE_REF: u8 = 20;
    /// One binary64: milliseconds since the Unix epoch.
    pub const TAG_DATETIME: u8 = 21;
    /// One INT-framed palette number.
    pub const TAG_BRICKCOLOR: u8 = 22;
    /// INT-framed keypoint count, then count x (time, value, envelope) binary64.
    pub const TAG_NUMBERSEQUENCE: u8 = 23;
    /// INT-framed keypoint count, then count x (time, r, g, b) binary64.
    pub const TAG_COLORSEQUENCE: u8 = 24;

    /// Default bound on recursive descent, both encode and decode.
    pub const DEFAULT_MAX_DEPTH: usize = 100;
    /// Default bound on a single decoded byte string (50 MB).
    pub const DEFAULT_MAX_BYTES_LEN: usize = 50 * 1024 * 1024;
    /// Default bound on the keypoint count of a decoded keyframe sequence.
    pub const DEFAULT_MAX_KEYFRAMES: usize = 10_000;

    /// Marker key of the placeholder table emitted for an aggregate whose
    /// domain constructor rejected the decoded fields.
    pub const PLACEHOLDER_KIND_KEY: &[u8] = b"$unresolved";
    /// Key holding the raw field values inside a placeholder table.
    pub const PLACEHOLDER_FIELDS_KEY: &[u8] = b"fields";
}

/// Configuration options for the codec.
pub mod config;
/// Error types and results.
pub mod error;
