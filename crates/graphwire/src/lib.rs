#![warn(missing_docs)]

//! Graphwire: a small public API facade for the workspace.
//!
//! This crate provides a clean, stable surface that re-exports the most
//! commonly used types for round-tripping value graphs:
//!
//! - The value universe (`Value`, `Table`, `TableKey`, the tuple types)
//! - Encode/decode entry points (`encode`, `decode` and their `_with` forms)
//! - Configuration and errors (`CodecConfig`, `CodecError`)
//!
//! Example
//! ```
//! use graphwire::prelude::*;
//!
//! // A sequence that contains itself round-trips with identity intact.
//! let a = Value::array(vec![Value::Int(1)]);
//! if let Value::Array(cell) = &a {
//!     cell.borrow_mut().push(a.clone());
//! }
//!
//! let bytes = encode(&a).unwrap();
//! let decoded = decode(&bytes).unwrap();
//!
//! if let Value::Array(cell) = &decoded {
//!     assert!(cell.borrow()[1].ptr_eq(&decoded));
//! }
//! ```

// Core configuration and errors
pub use graphwire_core::config::{CodecConfig, CompressionAlgorithm};
pub use graphwire_core::error::{CodecError, CodecResult};
// Codec: the value universe and entry points
pub use graphwire_codec::value::{
    ArrayRef, BrickColor, CFrame, Color3, ColorKeypoint, ColorSequence, DateTime, EnumItem,
    InstanceRef, NumberKeypoint, NumberSequence, Rect, Table, TableKey, TableRef, UDim2, Value,
    Vector2, Vector3,
};
pub use graphwire_codec::value_codec::{
    append_checksum, append_checksum_in_place, compress, decode, decode_payload, decode_with,
    decompress, encode, encode_payload, encode_with, validate_and_strip_checksum,
};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        decode, decode_with, encode, encode_with, CodecConfig, CodecError, CodecResult, Table,
        TableKey, Value,
    };
}
