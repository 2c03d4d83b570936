//! Conversions between the msgpack-flavored and JSON-flavored untyped trees.
//!
//! The untyped schema carries values through with no declared structure, so
//! the shape differences between the two wire formats are patched up here:
//! byte payloads become base64 strings in JSON, and non-string map keys are
//! rendered in their canonical text form (decimal digits for integers,
//! base64 for raw bytes).

use base64::prelude::{Engine, BASE64_STANDARD};

use crate::data::EncodingData;

/// Lowers a msgpack-flavored tree into a JSON-serializable tree.
pub fn msgpack_data_to_json_data(data: &EncodingData) -> EncodingData {
    match data {
        EncodingData::Bytes(b) => EncodingData::Str(BASE64_STANDARD.encode(b)),
        EncodingData::List(items) => {
            EncodingData::List(items.iter().map(msgpack_data_to_json_data).collect())
        }
        EncodingData::Map(pairs) => EncodingData::Map(
            pairs
                .iter()
                .map(|(key, value)| (key_to_json_key(key), msgpack_data_to_json_data(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn key_to_json_key(key: &EncodingData) -> EncodingData {
    match key {
        EncodingData::Uint(u) => EncodingData::Str(u.to_string()),
        EncodingData::Int(i) => EncodingData::Str(i.to_string()),
        EncodingData::Bytes(b) => EncodingData::Str(BASE64_STANDARD.encode(b)),
        other => other.clone(),
    }
}

/// Lifts a JSON-flavored tree into the msgpack-flavored shape.
///
/// Strings stay strings: without a schema there is no way to know whether a
/// string was base64-encoded bytes, so the conversion is structural only.
pub fn json_data_to_msgpack_data(data: &EncodingData) -> EncodingData {
    match data {
        EncodingData::List(items) => {
            EncodingData::List(items.iter().map(json_data_to_msgpack_data).collect())
        }
        EncodingData::Map(pairs) => EncodingData::Map(
            pairs
                .iter()
                .map(|(key, value)| (key.clone(), json_data_to_msgpack_data(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}
