#![warn(missing_docs)]

//! graphwire-codec: a self-describing binary codec for cyclic value graphs.
//!
//! Values are drawn from a tagged sum ([`Value`]) covering atoms, byte
//! strings, ordered sequences, keyed mappings and a family of fixed-shape
//! geometry/animation tuples. Aggregates are reference-counted, so a graph
//! can contain shared substructure and cycles; the codec preserves identity
//! end-to-end by emitting back-references on revisit.

/// The logical value universe and aggregate types.
pub mod value;
/// Encoding and decoding of value graphs.
pub mod value_codec;

pub use value::{Table, TableKey, Value};
pub use value_codec::{decode, decode_payload, decode_with, encode, encode_payload, encode_with};
