//! Standalone big-endian uint64 codec and coercion helpers.
//!
//! The wire protocol stores standalone unsigned 64-bit integers as
//! big-endian byte strings of up to 8 bytes, with shorter (even empty)
//! buffers meaning the high bytes are zero.

use thiserror::Error;

use crate::data::EncodingData;
use crate::int_decoding::{IntDecoding, MAX_SAFE_INTEGER};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Uint64Error {
    #[error("data has unacceptable length: expected at most 8 bytes, got {0}")]
    WrongLength(usize),
    #[error("integer exceeds maximum safe integer: {0}; decode with mixed or bigint int decoding")]
    ExceedsSafeInteger(u64),
    #[error("value is not a uint64: ({kind}) {detail}")]
    NotUint64 { kind: &'static str, detail: String },
}

/// Encodes an unsigned 64-bit integer as 8 big-endian bytes.
pub fn encode_uint64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decodes a big-endian unsigned integer of 0 to 8 bytes.
///
/// The returned tree node depends on `mode`: float-backed for `Unsafe`/`Safe`
/// (with `Safe` refusing values above 2^53 - 1), exact for `Bigint`, and
/// whichever fits for `Mixed`.
pub fn decode_uint64(data: &[u8], mode: IntDecoding) -> Result<EncodingData, Uint64Error> {
    if data.len() > 8 {
        return Err(Uint64Error::WrongLength(data.len()));
    }
    let mut value: u64 = 0;
    for &byte in data {
        value = (value << 8) | u64::from(byte);
    }
    apply_int_decoding(value, mode)
}

/// Converts an exact unsigned 64-bit integer to a tree node per `mode`.
pub fn apply_int_decoding(value: u64, mode: IntDecoding) -> Result<EncodingData, Uint64Error> {
    let is_big = value > MAX_SAFE_INTEGER;
    match mode {
        IntDecoding::Unsafe => Ok(EncodingData::Float(value as f64)),
        IntDecoding::Safe => {
            if is_big {
                Err(Uint64Error::ExceedsSafeInteger(value))
            } else {
                Ok(EncodingData::Float(value as f64))
            }
        }
        IntDecoding::Mixed => {
            if is_big {
                Ok(EncodingData::Uint(value))
            } else {
                Ok(EncodingData::Float(value as f64))
            }
        }
        IntDecoding::Bigint => Ok(EncodingData::Uint(value)),
    }
}

/// Coerces a tree node to an exact unsigned 64-bit integer.
///
/// Accepts exact uints, non-negative ints, and integral floats inside the
/// exactly-representable range. Everything else (negative, fractional, too
/// large, wrong kind) is an error.
pub fn ensure_uint64(data: &EncodingData) -> Result<u64, Uint64Error> {
    match data {
        EncodingData::Uint(u) => Ok(*u),
        EncodingData::Int(i) => {
            u64::try_from(*i).map_err(|_| Uint64Error::NotUint64 {
                kind: "int",
                detail: i.to_string(),
            })
        }
        EncodingData::Float(f) => {
            if f.fract() != 0.0 || *f < 0.0 || *f > MAX_SAFE_INTEGER as f64 {
                return Err(Uint64Error::NotUint64 {
                    kind: "float",
                    detail: f.to_string(),
                });
            }
            Ok(*f as u64)
        }
        other => Err(Uint64Error::NotUint64 {
            kind: other.kind(),
            detail: format!("{other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_boundaries() {
        assert_eq!(encode_uint64(0), [0u8; 8]);
        assert_eq!(encode_uint64(u64::MAX), [0xff; 8]);
        assert_eq!(encode_uint64(1), [0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn decode_accepts_short_buffers() {
        assert_eq!(
            decode_uint64(&[], IntDecoding::Bigint).unwrap(),
            EncodingData::Uint(0)
        );
        assert_eq!(
            decode_uint64(&[0x01, 0x00], IntDecoding::Bigint).unwrap(),
            EncodingData::Uint(256)
        );
        assert_eq!(
            decode_uint64(&[0xff; 8], IntDecoding::Bigint).unwrap(),
            EncodingData::Uint(u64::MAX)
        );
    }

    #[test]
    fn decode_rejects_long_buffers() {
        assert_eq!(
            decode_uint64(&[0u8; 9], IntDecoding::Bigint),
            Err(Uint64Error::WrongLength(9))
        );
    }

    #[test]
    fn safe_mode_refuses_big_values() {
        let big = encode_uint64(MAX_SAFE_INTEGER + 1);
        assert_eq!(
            decode_uint64(&big, IntDecoding::Safe),
            Err(Uint64Error::ExceedsSafeInteger(MAX_SAFE_INTEGER + 1))
        );
        let ok = encode_uint64(MAX_SAFE_INTEGER);
        assert_eq!(
            decode_uint64(&ok, IntDecoding::Safe).unwrap(),
            EncodingData::Float(MAX_SAFE_INTEGER as f64)
        );
    }

    #[test]
    fn mixed_mode_switches_representation() {
        assert_eq!(
            apply_int_decoding(7, IntDecoding::Mixed).unwrap(),
            EncodingData::Float(7.0)
        );
        assert_eq!(
            apply_int_decoding(MAX_SAFE_INTEGER + 1, IntDecoding::Mixed).unwrap(),
            EncodingData::Uint(MAX_SAFE_INTEGER + 1)
        );
    }

    #[test]
    fn ensure_uint64_coercion() {
        assert_eq!(ensure_uint64(&EncodingData::Uint(5)).unwrap(), 5);
        assert_eq!(ensure_uint64(&EncodingData::Float(5.0)).unwrap(), 5);
        assert_eq!(ensure_uint64(&EncodingData::Int(5)).unwrap(), 5);
        assert!(ensure_uint64(&EncodingData::Float(1.5)).is_err());
        assert!(ensure_uint64(&EncodingData::Float(-1.0)).is_err());
        assert!(ensure_uint64(&EncodingData::Int(-1)).is_err());
        assert!(ensure_uint64(&EncodingData::Str("5".into())).is_err());
    }
}
