//! Bigint-preserving JSON text codec.
//!
//! Integer literals never pass through `f64` on the way in or out: the
//! decoder captures digit strings and converts them per [`IntDecoding`],
//! and the encoder emits `Uint`/`Int` as bare literals regardless of
//! magnitude.

mod decoder;
mod encoder;
mod error;

pub use decoder::JsonDecoder;
pub use encoder::JsonEncoder;
pub use error::JsonError;

use crate::data::EncodingData;
use crate::int_decoding::IntDecoding;

/// Serializes a value tree to JSON text.
pub fn encode(value: &EncodingData) -> Result<String, JsonError> {
    let bytes = JsonEncoder::new().encode(value)?;
    String::from_utf8(bytes).map_err(|_| JsonError::InvalidUtf8)
}

/// Parses JSON text to a value tree, without a schema.
pub fn decode(text: &str, int_decoding: IntDecoding) -> Result<EncodingData, JsonError> {
    JsonDecoder::decode(text, int_decoding)
}
