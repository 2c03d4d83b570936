//! Schema-driven codec for the canonical wire formats of an Algorand-style
//! blockchain client.
//!
//! Typed domain objects convert to and from two wire representations
//! through a shared intermediate tree ([`EncodingData`]):
//!
//! - **canonical MessagePack** ([`msgpack`]): byte-exact with the reference
//!   protocol — minimal-width integers, map keys sorted by their encoded
//!   bytes, explicit binary-vs-string leaf typing, default-valued fields
//!   omitted;
//! - **JSON** ([`json`]): integer literals stay exact beyond 2^53 - 1, byte
//!   arrays appear as base64, and binary round-trips losslessly through a
//!   reversible surrogate escape.
//!
//! The [`Schema`] enum is the closed set of shapes a field can have;
//! [`Encodable`] is the boundary a domain type implements. Everything is
//! synchronous and pure: schemas are immutable singletons, and every
//! operation is a deterministic function of its inputs.

mod address;
mod convert;
mod data;
mod encodable;
mod int_decoding;
mod uint64;

pub mod json;
pub mod msgpack;
pub mod schema;

pub use address::{
    Address, AddressError, ADDRESS_BYTE_LENGTH, ADDRESS_STRING_LENGTH, CHECKSUM_BYTE_LENGTH,
};
pub use data::EncodingData;
pub use encodable::{
    decode_json, decode_json_data, decode_msgpack, decode_msgpack_data, encode_json,
    encode_json_data, encode_json_with_options, encode_msgpack, encode_msgpack_data, Encodable,
};
pub use int_decoding::{IntDecoding, MAX_SAFE_INTEGER};
pub use schema::{
    NamedMapEntry, NamedMapSchema, PrepareJsonOptions, Schema, SchemaError,
    BLOCK_HASH_BYTE_LENGTH,
};
pub use uint64::{decode_uint64, encode_uint64, ensure_uint64, Uint64Error};
