//! Canonical MessagePack codec.
//!
//! Encoding is strict: minimal-width integers, sorted map keys, explicit
//! bin-vs-str leaf typing. Decoding is lenient and accepts anything the
//! reference protocol could have produced.

pub mod constants;
mod decoder;
mod encoder;
mod error;
mod raw_string_provider;

pub use decoder::MsgpackDecoder;
pub use encoder::MsgpackEncoder;
pub use error::MsgpackError;
pub use raw_string_provider::{PathSegment, RawStringProvider};

use crate::data::EncodingData;

/// Encodes a value tree to canonical msgpack bytes.
pub fn encode(value: &EncodingData) -> Result<Vec<u8>, MsgpackError> {
    MsgpackEncoder::new().encode(value)
}

/// Decodes a complete msgpack buffer to a value tree, without a schema.
pub fn decode(data: &[u8]) -> Result<EncodingData, MsgpackError> {
    MsgpackDecoder::decode(data)
}
