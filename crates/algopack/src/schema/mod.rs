//! Schema-driven conversion between logical values and wire trees.
//!
//! A [`Schema`] is one of a closed set of variants. Each variant knows how to
//! lower a logical value into an [`EncodingData`] tree for one of the two
//! wire formats (*prepare*) and how to lift a decoded tree back into the
//! logical value (*from prepared*). Schemas are immutable; per-type schemas
//! are built once and shared.
//!
//! Logical values are themselves `EncodingData` trees in a fixed shape per
//! variant: byte-backed leaves (byte arrays, addresses, block hashes, binary
//! strings) are `Bytes`, uint64 values are exact `Uint`s, and keyed maps use
//! their logical key kind. The wire-facing shape may differ, e.g. an address
//! is 32 raw bytes in msgpack but a checksummed base32 string in JSON.

mod map;

pub use map::{NamedMapEntry, NamedMapSchema};

use base64::prelude::{Engine, BASE64_STANDARD};
use data_encoding::BASE32_NOPAD;
use thiserror::Error;

use crate::address::{Address, AddressError, ADDRESS_BYTE_LENGTH};
use crate::convert;
use crate::data::EncodingData;
use crate::json::JsonError;
use crate::msgpack::{MsgpackError, RawStringProvider};
use crate::uint64::{ensure_uint64, Uint64Error};

pub const BLOCK_HASH_BYTE_LENGTH: usize = 32;
const BLOCK_HASH_PREFIX: &str = "blk-";
/// 32 bytes encoded in unpadded base32.
const BLOCK_HASH_BASE32_LENGTH: usize = 52;

pub(crate) const ABSENT: EncodingData = EncodingData::Absent;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("invalid value for {expected} schema: ({kind}) {detail}")]
    UnexpectedValue {
        expected: &'static str,
        kind: &'static str,
        detail: String,
    },
    #[error("invalid byte array length: wanted {wanted}, got {got}")]
    WrongLength { wanted: usize, got: usize },
    #[error("invalid block hash: {0}")]
    InvalidBlockHash(String),
    #[error("invalid base64 string: {0}")]
    InvalidBase64(String),
    #[error("invalid map key: {0}")]
    InvalidMapKey(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("missing key: {0}")]
    MissingKey(String),
    #[error("embedded entries must have an empty key")]
    EmbeddedKeyNotEmpty,
    #[error("embedded entry value schema must be a named map")]
    EmbeddedValueNotNamedMap,
    #[error(
        "invalid UTF-8 byte array encountered; enable lossy binary string \
         conversion to bypass this check (base64 value: {0})"
    )]
    InvalidUtf8ByteArray(String),
    #[error(transparent)]
    Msgpack(#[from] MsgpackError),
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error(transparent)]
    Uint64(#[from] Uint64Error),
    #[error(transparent)]
    Address(#[from] AddressError),
}

pub(crate) fn mismatch(expected: &'static str, got: &EncodingData) -> SchemaError {
    SchemaError::UnexpectedValue {
        expected,
        kind: got.kind(),
        detail: format!("{got:?}"),
    }
}

/// Options for JSON preparation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrepareJsonOptions {
    /// Allow binary-string leaves holding invalid UTF-8 to be serialized
    /// with the reversible surrogate escape instead of failing.
    pub lossy_binary_string_conversion: bool,
}

/// The closed set of schema variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Boolean,
    String,
    Uint64,
    /// 32-byte public key; base32 with checksum suffix in JSON.
    Address,
    /// 32-byte hash; `"blk-"` plus unpadded base32 in JSON.
    BlockHash,
    ByteArray,
    FixedLengthByteArray { length: usize },
    /// Byte array carried with the string wire type in msgpack, valid UTF-8
    /// or not. The single consumer of the raw string provider.
    BinaryString,
    /// Passes values through with no declared structure.
    Untyped,
    Optional(Box<Schema>),
    Array(Box<Schema>),
    Uint64Map(Box<Schema>),
    StringMap(Box<Schema>),
    ByteArrayMap(Box<Schema>),
    BinaryStringMap(Box<Schema>),
    NamedMap(NamedMapSchema),
}

impl Schema {
    pub fn default_value(&self) -> EncodingData {
        match self {
            Schema::Boolean => EncodingData::Bool(false),
            Schema::String => EncodingData::Str(String::new()),
            Schema::Uint64 => EncodingData::Uint(0),
            Schema::Address => EncodingData::Bytes(vec![0; ADDRESS_BYTE_LENGTH]),
            Schema::BlockHash => EncodingData::Bytes(vec![0; BLOCK_HASH_BYTE_LENGTH]),
            Schema::ByteArray | Schema::BinaryString => EncodingData::Bytes(Vec::new()),
            Schema::FixedLengthByteArray { length } => EncodingData::Bytes(vec![0; *length]),
            Schema::Untyped | Schema::Optional(_) => EncodingData::Absent,
            Schema::Array(_) => EncodingData::List(Vec::new()),
            Schema::Uint64Map(_)
            | Schema::StringMap(_)
            | Schema::ByteArrayMap(_)
            | Schema::BinaryStringMap(_) => EncodingData::Map(Vec::new()),
            Schema::NamedMap(named) => named.default_value(),
        }
    }

    pub fn is_default_value(&self, data: &EncodingData) -> bool {
        match self {
            Schema::Boolean => matches!(data, EncodingData::Bool(false)),
            Schema::String => matches!(data, EncodingData::Str(s) if s.is_empty()),
            Schema::Uint64 => matches!(
                data,
                EncodingData::Uint(0) | EncodingData::Int(0)
            ) || matches!(data, EncodingData::Float(f) if *f == 0.0),
            Schema::Address => is_zero_bytes(data, ADDRESS_BYTE_LENGTH),
            Schema::BlockHash => is_zero_bytes(data, BLOCK_HASH_BYTE_LENGTH),
            Schema::ByteArray | Schema::BinaryString => {
                matches!(data, EncodingData::Bytes(b) if b.is_empty())
            }
            Schema::FixedLengthByteArray { length } => is_zero_bytes(data, *length),
            Schema::Untyped => matches!(data, EncodingData::Absent),
            Schema::Optional(inner) => {
                matches!(data, EncodingData::Absent) || inner.is_default_value(data)
            }
            Schema::Array(_) => matches!(data, EncodingData::List(l) if l.is_empty()),
            Schema::Uint64Map(_)
            | Schema::StringMap(_)
            | Schema::ByteArrayMap(_)
            | Schema::BinaryStringMap(_) => {
                matches!(data, EncodingData::Map(m) if m.is_empty())
            }
            Schema::NamedMap(named) => named.is_default_value(data),
        }
    }

    /// Lowers a logical value into the msgpack-flavored tree.
    pub fn prepare_msgpack(&self, data: &EncodingData) -> Result<EncodingData, SchemaError> {
        match self {
            Schema::Boolean => match data {
                EncodingData::Bool(b) => Ok(EncodingData::Bool(*b)),
                other => Err(mismatch("boolean", other)),
            },
            Schema::String => match data {
                EncodingData::Str(s) => Ok(EncodingData::Str(s.clone())),
                other => Err(mismatch("string", other)),
            },
            Schema::Uint64 => Ok(EncodingData::Uint(ensure_uint64(data)?)),
            Schema::Address => {
                let bytes = expect_bytes("address", data)?;
                check_length(bytes, ADDRESS_BYTE_LENGTH)?;
                Ok(EncodingData::Bytes(bytes.to_vec()))
            }
            Schema::BlockHash => {
                let bytes = expect_bytes("block hash", data)?;
                check_length(bytes, BLOCK_HASH_BYTE_LENGTH)?;
                Ok(EncodingData::Bytes(bytes.to_vec()))
            }
            Schema::ByteArray => {
                Ok(EncodingData::Bytes(expect_bytes("byte array", data)?.to_vec()))
            }
            Schema::FixedLengthByteArray { length } => {
                let bytes = expect_bytes("byte array", data)?;
                check_length(bytes, *length)?;
                Ok(EncodingData::Bytes(bytes.to_vec()))
            }
            Schema::BinaryString => Ok(EncodingData::BinaryStr(
                expect_bytes("binary string", data)?.to_vec(),
            )),
            Schema::Untyped => Ok(data.clone()),
            Schema::Optional(inner) => match data {
                EncodingData::Absent => Ok(EncodingData::Absent),
                present => inner.prepare_msgpack(present),
            },
            Schema::Array(item) => match data {
                EncodingData::List(items) => Ok(EncodingData::List(
                    items
                        .iter()
                        .map(|i| item.prepare_msgpack(i))
                        .collect::<Result<_, _>>()?,
                )),
                other => Err(mismatch("array", other)),
            },
            Schema::Uint64Map(value) => {
                map::prepare_msgpack_keyed(map::MapKeyKind::Uint64, value, data)
            }
            Schema::StringMap(value) => {
                map::prepare_msgpack_keyed(map::MapKeyKind::String, value, data)
            }
            Schema::ByteArrayMap(value) => {
                map::prepare_msgpack_keyed(map::MapKeyKind::ByteArray, value, data)
            }
            Schema::BinaryStringMap(value) => {
                map::prepare_msgpack_keyed(map::MapKeyKind::BinaryString, value, data)
            }
            Schema::NamedMap(named) => named.prepare_msgpack(data),
        }
    }

    /// Lifts a decoded msgpack tree back into the logical value. The
    /// provider is scoped to the same node as `encoded` and serves the
    /// binary-string leaves, which need the untouched wire bytes.
    pub fn from_prepared_msgpack(
        &self,
        encoded: &EncodingData,
        provider: &RawStringProvider<'_>,
    ) -> Result<EncodingData, SchemaError> {
        match self {
            Schema::Boolean => match encoded {
                EncodingData::Bool(b) => Ok(EncodingData::Bool(*b)),
                other => Err(mismatch("boolean", other)),
            },
            Schema::String => match encoded {
                EncodingData::Str(s) => Ok(EncodingData::Str(s.clone())),
                EncodingData::BinaryStr(b) => Ok(EncodingData::Str(
                    String::from_utf8_lossy(b).into_owned(),
                )),
                other => Err(mismatch("string", other)),
            },
            Schema::Uint64 => Ok(EncodingData::Uint(ensure_uint64(encoded)?)),
            Schema::Address => {
                let bytes = expect_bytes("address", encoded)?;
                check_length(bytes, ADDRESS_BYTE_LENGTH)?;
                Ok(EncodingData::Bytes(bytes.to_vec()))
            }
            Schema::BlockHash => {
                let bytes = expect_bytes("block hash", encoded)?;
                check_length(bytes, BLOCK_HASH_BYTE_LENGTH)?;
                Ok(EncodingData::Bytes(bytes.to_vec()))
            }
            Schema::ByteArray => Ok(EncodingData::Bytes(
                expect_bytes("byte array", encoded)?.to_vec(),
            )),
            Schema::FixedLengthByteArray { length } => {
                let bytes = expect_bytes("byte array", encoded)?;
                check_length(bytes, *length)?;
                Ok(EncodingData::Bytes(bytes.to_vec()))
            }
            Schema::BinaryString => {
                // The decoded tree is lossy for invalid UTF-8; recover the
                // exact wire bytes instead.
                let raw = provider.raw_string_at_current_location()?;
                Ok(EncodingData::Bytes(raw.to_vec()))
            }
            Schema::Untyped => Ok(encoded.clone()),
            Schema::Optional(inner) => match encoded {
                EncodingData::Absent => Ok(EncodingData::Absent),
                present => inner.from_prepared_msgpack(present, provider),
            },
            Schema::Array(item) => match encoded {
                EncodingData::List(items) => Ok(EncodingData::List(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, v)| {
                            item.from_prepared_msgpack(v, &provider.with_array_element(i))
                        })
                        .collect::<Result<_, _>>()?,
                )),
                other => Err(mismatch("array", other)),
            },
            Schema::Uint64Map(value) => map::from_prepared_msgpack_keyed(
                map::MapKeyKind::Uint64,
                value,
                encoded,
                provider,
            ),
            Schema::StringMap(value) => map::from_prepared_msgpack_keyed(
                map::MapKeyKind::String,
                value,
                encoded,
                provider,
            ),
            Schema::ByteArrayMap(value) => map::from_prepared_msgpack_keyed(
                map::MapKeyKind::ByteArray,
                value,
                encoded,
                provider,
            ),
            Schema::BinaryStringMap(value) => map::from_prepared_msgpack_keyed(
                map::MapKeyKind::BinaryString,
                value,
                encoded,
                provider,
            ),
            Schema::NamedMap(named) => named.from_prepared_msgpack(encoded, provider),
        }
    }

    /// Lowers a logical value into the JSON-flavored tree.
    pub fn prepare_json(
        &self,
        data: &EncodingData,
        options: &PrepareJsonOptions,
    ) -> Result<EncodingData, SchemaError> {
        match self {
            Schema::Boolean => match data {
                EncodingData::Bool(b) => Ok(EncodingData::Bool(*b)),
                other => Err(mismatch("boolean", other)),
            },
            Schema::String => match data {
                EncodingData::Str(s) => Ok(EncodingData::Str(s.clone())),
                other => Err(mismatch("string", other)),
            },
            Schema::Uint64 => Ok(EncodingData::Uint(ensure_uint64(data)?)),
            Schema::Address => {
                let bytes = expect_bytes("address", data)?;
                let address = Address::from_public_key(bytes)?;
                Ok(EncodingData::Str(address.to_string()))
            }
            Schema::BlockHash => {
                let bytes = expect_bytes("block hash", data)?;
                check_length(bytes, BLOCK_HASH_BYTE_LENGTH)?;
                Ok(EncodingData::Str(format!(
                    "{BLOCK_HASH_PREFIX}{}",
                    BASE32_NOPAD.encode(bytes)
                )))
            }
            Schema::ByteArray => Ok(EncodingData::Str(
                BASE64_STANDARD.encode(expect_bytes("byte array", data)?),
            )),
            Schema::FixedLengthByteArray { length } => {
                let bytes = expect_bytes("byte array", data)?;
                check_length(bytes, *length)?;
                Ok(EncodingData::Str(BASE64_STANDARD.encode(bytes)))
            }
            Schema::BinaryString => {
                let bytes = expect_bytes("binary string", data)?;
                prepare_binary_string_json(bytes, options)
            }
            Schema::Untyped => Ok(convert::msgpack_data_to_json_data(data)),
            Schema::Optional(inner) => match data {
                EncodingData::Absent => Ok(EncodingData::Absent),
                present => inner.prepare_json(present, options),
            },
            Schema::Array(item) => match data {
                EncodingData::List(items) => Ok(EncodingData::List(
                    items
                        .iter()
                        .map(|i| item.prepare_json(i, options))
                        .collect::<Result<_, _>>()?,
                )),
                other => Err(mismatch("array", other)),
            },
            Schema::Uint64Map(value) => {
                map::prepare_json_keyed(map::MapKeyKind::Uint64, value, data, options)
            }
            Schema::StringMap(value) => {
                map::prepare_json_keyed(map::MapKeyKind::String, value, data, options)
            }
            Schema::ByteArrayMap(value) => {
                map::prepare_json_keyed(map::MapKeyKind::ByteArray, value, data, options)
            }
            Schema::BinaryStringMap(value) => {
                map::prepare_json_keyed(map::MapKeyKind::BinaryString, value, data, options)
            }
            Schema::NamedMap(named) => named.prepare_json(data, options),
        }
    }

    /// Lifts a decoded JSON tree back into the logical value.
    pub fn from_prepared_json(&self, encoded: &EncodingData) -> Result<EncodingData, SchemaError> {
        match self {
            Schema::Boolean => match encoded {
                EncodingData::Bool(b) => Ok(EncodingData::Bool(*b)),
                other => Err(mismatch("boolean", other)),
            },
            Schema::String => match encoded {
                EncodingData::Str(s) => Ok(EncodingData::Str(s.clone())),
                other => Err(mismatch("string", other)),
            },
            Schema::Uint64 => Ok(EncodingData::Uint(ensure_uint64(encoded)?)),
            Schema::Address => match encoded {
                EncodingData::Str(s) => {
                    let address = Address::from_string(s)?;
                    Ok(EncodingData::Bytes(address.public_key.to_vec()))
                }
                other => Err(mismatch("address", other)),
            },
            Schema::BlockHash => match encoded {
                EncodingData::Str(s) => decode_block_hash(s),
                other => Err(mismatch("block hash", other)),
            },
            Schema::ByteArray => match encoded {
                // Tolerated for interoperability: some producers emit null
                // for empty byte arrays.
                EncodingData::Absent => Ok(self.default_value()),
                EncodingData::Str(s) => Ok(EncodingData::Bytes(decode_base64(s)?)),
                other => Err(mismatch("byte array", other)),
            },
            Schema::FixedLengthByteArray { length } => match encoded {
                EncodingData::Str(s) => {
                    let bytes = decode_base64(s)?;
                    check_length(&bytes, *length)?;
                    Ok(EncodingData::Bytes(bytes))
                }
                other => Err(mismatch("byte array", other)),
            },
            Schema::BinaryString => match encoded {
                EncodingData::Str(s) => Ok(EncodingData::Bytes(s.as_bytes().to_vec())),
                EncodingData::BinaryStr(b) => Ok(EncodingData::Bytes(b.clone())),
                other => Err(mismatch("binary string", other)),
            },
            Schema::Untyped => Ok(convert::json_data_to_msgpack_data(encoded)),
            Schema::Optional(inner) => match encoded {
                EncodingData::Absent => Ok(EncodingData::Absent),
                present => inner.from_prepared_json(present),
            },
            Schema::Array(item) => match encoded {
                EncodingData::List(items) => Ok(EncodingData::List(
                    items
                        .iter()
                        .map(|i| item.from_prepared_json(i))
                        .collect::<Result<_, _>>()?,
                )),
                other => Err(mismatch("array", other)),
            },
            Schema::Uint64Map(value) => {
                map::from_prepared_json_keyed(map::MapKeyKind::Uint64, value, encoded)
            }
            Schema::StringMap(value) => {
                map::from_prepared_json_keyed(map::MapKeyKind::String, value, encoded)
            }
            Schema::ByteArrayMap(value) => {
                map::from_prepared_json_keyed(map::MapKeyKind::ByteArray, value, encoded)
            }
            Schema::BinaryStringMap(value) => {
                map::from_prepared_json_keyed(map::MapKeyKind::BinaryString, value, encoded)
            }
            Schema::NamedMap(named) => named.from_prepared_json(encoded),
        }
    }
}

fn expect_bytes<'a>(
    expected: &'static str,
    data: &'a EncodingData,
) -> Result<&'a [u8], SchemaError> {
    match data {
        EncodingData::Bytes(b) => Ok(b),
        other => Err(mismatch(expected, other)),
    }
}

fn check_length(bytes: &[u8], wanted: usize) -> Result<(), SchemaError> {
    if bytes.len() != wanted {
        return Err(SchemaError::WrongLength {
            wanted,
            got: bytes.len(),
        });
    }
    Ok(())
}

fn is_zero_bytes(data: &EncodingData, length: usize) -> bool {
    matches!(data, EncodingData::Bytes(b) if b.len() == length && b.iter().all(|&x| x == 0))
}

pub(crate) fn prepare_binary_string_json(
    bytes: &[u8],
    options: &PrepareJsonOptions,
) -> Result<EncodingData, SchemaError> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(EncodingData::Str(s.to_string())),
        Err(_) if options.lossy_binary_string_conversion => {
            Ok(EncodingData::BinaryStr(bytes.to_vec()))
        }
        Err(_) => Err(SchemaError::InvalidUtf8ByteArray(
            BASE64_STANDARD.encode(bytes),
        )),
    }
}

pub(crate) fn decode_base64(s: &str) -> Result<Vec<u8>, SchemaError> {
    BASE64_STANDARD
        .decode(s)
        .map_err(|_| SchemaError::InvalidBase64(s.to_string()))
}

fn decode_block_hash(s: &str) -> Result<EncodingData, SchemaError> {
    if s.len() != BLOCK_HASH_PREFIX.len() + BLOCK_HASH_BASE32_LENGTH
        || !s.starts_with(BLOCK_HASH_PREFIX)
    {
        return Err(SchemaError::InvalidBlockHash(s.to_string()));
    }
    let bytes = BASE32_NOPAD
        .decode(s[BLOCK_HASH_PREFIX.len()..].as_bytes())
        .map_err(|_| SchemaError::InvalidBlockHash(s.to_string()))?;
    check_length(&bytes, BLOCK_HASH_BYTE_LENGTH)?;
    Ok(EncodingData::Bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_json(schema: &Schema, value: &EncodingData) -> EncodingData {
        let prepared = schema
            .prepare_json(value, &PrepareJsonOptions::default())
            .unwrap();
        schema.from_prepared_json(&prepared).unwrap()
    }

    #[test]
    fn leaf_defaults() {
        assert_eq!(Schema::Boolean.default_value(), EncodingData::Bool(false));
        assert_eq!(Schema::Uint64.default_value(), EncodingData::Uint(0));
        assert_eq!(
            Schema::FixedLengthByteArray { length: 2 }.default_value(),
            EncodingData::Bytes(vec![0, 0])
        );
        assert!(Schema::Uint64.is_default_value(&EncodingData::Float(0.0)));
        assert!(!Schema::Uint64.is_default_value(&EncodingData::Uint(1)));
    }

    #[test]
    fn optional_treats_inner_default_as_default() {
        let schema = Schema::Optional(Box::new(Schema::Uint64));
        assert!(schema.is_default_value(&EncodingData::Absent));
        assert!(schema.is_default_value(&EncodingData::Uint(0)));
        assert!(!schema.is_default_value(&EncodingData::Uint(1)));
    }

    #[test]
    fn address_json_round_trip() {
        let pk: Vec<u8> = (0u8..32).collect();
        let value = EncodingData::Bytes(pk.clone());
        let prepared = Schema::Address
            .prepare_json(&value, &PrepareJsonOptions::default())
            .unwrap();
        match &prepared {
            EncodingData::Str(s) => assert_eq!(s.len(), 58),
            other => panic!("expected string, got {other:?}"),
        }
        assert_eq!(roundtrip_json(&Schema::Address, &value), value);
    }

    #[test]
    fn block_hash_json_form() {
        let value = EncodingData::Bytes(vec![0; 32]);
        let prepared = Schema::BlockHash
            .prepare_json(&value, &PrepareJsonOptions::default())
            .unwrap();
        match &prepared {
            EncodingData::Str(s) => {
                assert!(s.starts_with("blk-"));
                assert_eq!(s.len(), 56);
            }
            other => panic!("expected string, got {other:?}"),
        }
        assert_eq!(roundtrip_json(&Schema::BlockHash, &value), value);
        assert_eq!(
            Schema::BlockHash.from_prepared_json(&EncodingData::Str("nope".into())),
            Err(SchemaError::InvalidBlockHash("nope".into()))
        );
    }

    #[test]
    fn fixed_length_byte_array_enforces_length() {
        let schema = Schema::FixedLengthByteArray { length: 3 };
        assert_eq!(
            schema.prepare_msgpack(&EncodingData::Bytes(vec![1, 2])),
            Err(SchemaError::WrongLength { wanted: 3, got: 2 })
        );
    }

    #[test]
    fn binary_string_json_lossy_option() {
        let invalid = EncodingData::Bytes(vec![b'a', 0xff]);
        let strict = Schema::BinaryString.prepare_json(&invalid, &PrepareJsonOptions::default());
        assert!(matches!(
            strict,
            Err(SchemaError::InvalidUtf8ByteArray(_))
        ));
        let lossy = Schema::BinaryString
            .prepare_json(
                &invalid,
                &PrepareJsonOptions {
                    lossy_binary_string_conversion: true,
                },
            )
            .unwrap();
        assert_eq!(lossy, EncodingData::BinaryStr(vec![b'a', 0xff]));
        assert_eq!(
            Schema::BinaryString.from_prepared_json(&lossy).unwrap(),
            invalid
        );
    }

    #[test]
    fn byte_array_json_accepts_null() {
        assert_eq!(
            Schema::ByteArray
                .from_prepared_json(&EncodingData::Absent)
                .unwrap(),
            EncodingData::Bytes(vec![])
        );
    }
}
