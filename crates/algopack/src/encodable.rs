//! The boundary between domain types and the schema machinery.
//!
//! A domain type implements [`Encodable`] by exposing its schema and
//! converting itself to and from the intermediate tree. The schema is built
//! once per type and shared, typically through a `std::sync::OnceLock`:
//!
//! ```
//! use std::sync::OnceLock;
//!
//! use algopack::{
//!     Encodable, EncodingData, NamedMapEntry, NamedMapSchema, Schema, SchemaError,
//! };
//!
//! struct Account {
//!     balance: u64,
//! }
//!
//! impl Encodable for Account {
//!     fn encoding_schema() -> &'static Schema {
//!         static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::NamedMap(
//!                 NamedMapSchema::new(vec![NamedMapEntry::new("bal", Schema::Uint64)])
//!                     .expect("valid schema"),
//!             )
//!         })
//!     }
//!
//!     fn to_encoding_data(&self) -> EncodingData {
//!         EncodingData::map_from_entries([("bal", EncodingData::Uint(self.balance))])
//!     }
//!
//!     fn from_encoding_data(data: &EncodingData) -> Result<Self, SchemaError> {
//!         match data.map_get("bal") {
//!             Some(EncodingData::Uint(balance)) => Ok(Account { balance: *balance }),
//!             _ => Err(SchemaError::MissingKey("bal".into())),
//!         }
//!     }
//! }
//! ```

use crate::data::EncodingData;
use crate::int_decoding::IntDecoding;
use crate::json;
use crate::msgpack::{self, RawStringProvider};
use crate::schema::{PrepareJsonOptions, Schema, SchemaError};

/// A type that can be encoded to and decoded from both wire formats through
/// its schema.
pub trait Encodable {
    /// The schema for this type. Built once and shared for every value.
    fn encoding_schema() -> &'static Schema
    where
        Self: Sized;

    /// Converts this value to the logical tree shape its schema expects.
    fn to_encoding_data(&self) -> EncodingData;

    /// Rebuilds a value from the logical tree produced by decoding.
    fn from_encoding_data(data: &EncodingData) -> Result<Self, SchemaError>
    where
        Self: Sized;
}

/// Encodes a value to canonical msgpack bytes.
pub fn encode_msgpack<T: Encodable>(value: &T) -> Result<Vec<u8>, SchemaError> {
    encode_msgpack_data(&value.to_encoding_data(), T::encoding_schema())
}

/// Encodes a logical tree under `schema` to canonical msgpack bytes.
pub fn encode_msgpack_data(
    data: &EncodingData,
    schema: &Schema,
) -> Result<Vec<u8>, SchemaError> {
    let prepared = schema.prepare_msgpack(data)?;
    Ok(msgpack::encode(&prepared)?)
}

/// Decodes canonical msgpack bytes to a value.
pub fn decode_msgpack<T: Encodable>(bytes: &[u8]) -> Result<T, SchemaError> {
    let data = decode_msgpack_data(bytes, T::encoding_schema())?;
    T::from_encoding_data(&data)
}

/// Decodes msgpack bytes under `schema` to a logical tree.
///
/// The input buffer backs a [`RawStringProvider`] threaded through the
/// schema walk, so binary-string leaves recover their exact wire bytes even
/// when they are not valid UTF-8.
pub fn decode_msgpack_data(bytes: &[u8], schema: &Schema) -> Result<EncodingData, SchemaError> {
    let decoded = msgpack::decode(bytes)?;
    let provider = RawStringProvider::new(bytes);
    schema.from_prepared_msgpack(&decoded, &provider)
}

/// Encodes a value to JSON text with default options.
pub fn encode_json<T: Encodable>(value: &T) -> Result<String, SchemaError> {
    encode_json_data(
        &value.to_encoding_data(),
        T::encoding_schema(),
        &PrepareJsonOptions::default(),
    )
}

/// Encodes a value to JSON text.
pub fn encode_json_with_options<T: Encodable>(
    value: &T,
    options: &PrepareJsonOptions,
) -> Result<String, SchemaError> {
    encode_json_data(&value.to_encoding_data(), T::encoding_schema(), options)
}

/// Encodes a logical tree under `schema` to JSON text.
pub fn encode_json_data(
    data: &EncodingData,
    schema: &Schema,
    options: &PrepareJsonOptions,
) -> Result<String, SchemaError> {
    let prepared = schema.prepare_json(data, options)?;
    Ok(json::encode(&prepared)?)
}

/// Decodes JSON text to a value.
pub fn decode_json<T: Encodable>(text: &str) -> Result<T, SchemaError> {
    let data = decode_json_data(text, T::encoding_schema())?;
    T::from_encoding_data(&data)
}

/// Decodes JSON text under `schema` to a logical tree.
///
/// Integer literals are parsed exactly; the schema decides their final
/// representation, so no [`IntDecoding`] choice is exposed here.
pub fn decode_json_data(text: &str, schema: &Schema) -> Result<EncodingData, SchemaError> {
    let decoded = json::decode(text, IntDecoding::Bigint)?;
    schema.from_prepared_json(&decoded)
}
