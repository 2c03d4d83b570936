//! `JsonEncoder` — JSON encoder (writes UTF-8 JSON to a Writer buffer).
//!
//! Unlike standard JSON serializers, this encoder:
//! - writes `Uint`/`Int` as bare digit literals regardless of magnitude, so
//!   values above 2^53 - 1 stay exact JSON numbers;
//! - writes `BinaryStr` payloads as strings where each invalid UTF-8 byte
//!   becomes an unpaired `\udcXX` low-surrogate escape, which the decoder
//!   maps back to the original byte;
//! - writes `Bytes` as plain base64 strings.

use algopack_buffers::Writer;
use base64::prelude::{Engine, BASE64_STANDARD};

use super::error::JsonError;
use crate::data::EncodingData;

pub struct JsonEncoder {
    pub writer: Writer,
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(),
        }
    }

    pub fn encode(&mut self, value: &EncodingData) -> Result<Vec<u8>, JsonError> {
        self.writer.reset();
        self.write_any(value)?;
        Ok(self.writer.flush())
    }

    pub fn write_any(&mut self, value: &EncodingData) -> Result<(), JsonError> {
        match value {
            EncodingData::Absent => {
                self.writer.ascii("null");
                Ok(())
            }
            EncodingData::Bool(b) => {
                self.writer.ascii(if *b { "true" } else { "false" });
                Ok(())
            }
            EncodingData::Uint(u) => {
                self.writer.ascii(&u.to_string());
                Ok(())
            }
            EncodingData::Int(i) => {
                self.writer.ascii(&i.to_string());
                Ok(())
            }
            EncodingData::Float(f) => {
                self.writer.ascii(&format_float(*f));
                Ok(())
            }
            EncodingData::Str(s) => {
                self.write_str(s);
                Ok(())
            }
            EncodingData::BinaryStr(b) => {
                self.write_binary_str(b);
                Ok(())
            }
            EncodingData::Bytes(b) => {
                self.write_bin(b);
                Ok(())
            }
            EncodingData::List(items) => self.write_arr(items),
            EncodingData::Map(pairs) => self.write_obj(pairs),
        }
    }

    /// Writes binary data as a plain base64 JSON string.
    pub fn write_bin(&mut self, buf: &[u8]) {
        self.writer.u8(b'"');
        self.writer.ascii(&BASE64_STANDARD.encode(buf));
        self.writer.u8(b'"');
    }

    pub fn write_str(&mut self, s: &str) {
        self.writer.u8(b'"');
        self.write_escaped(s.as_bytes());
        self.writer.u8(b'"');
    }

    /// Writes a byte payload as a JSON string. Valid UTF-8 runs are written
    /// as ordinary (escaped) text; each invalid byte becomes an unpaired
    /// `\udcXX` low-surrogate escape.
    pub fn write_binary_str(&mut self, bytes: &[u8]) {
        self.writer.u8(b'"');
        let mut rest = bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    self.write_escaped(s.as_bytes());
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    self.write_escaped(valid);
                    let invalid_len = e.error_len().unwrap_or(after.len());
                    for &byte in &after[..invalid_len] {
                        self.writer.ascii(&format!("\\udc{byte:02x}"));
                    }
                    rest = &after[invalid_len..];
                }
            }
        }
        self.writer.u8(b'"');
    }

    /// Escapes and writes string content (no surrounding quotes). The input
    /// must be valid UTF-8; bytes above 0x7f pass through untouched.
    fn write_escaped(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match byte {
                b'"' => self.writer.ascii("\\\""),
                b'\\' => self.writer.ascii("\\\\"),
                0x08 => self.writer.ascii("\\b"),
                0x0c => self.writer.ascii("\\f"),
                b'\n' => self.writer.ascii("\\n"),
                b'\r' => self.writer.ascii("\\r"),
                b'\t' => self.writer.ascii("\\t"),
                c if c < 0x20 => self.writer.ascii(&format!("\\u{c:04x}")),
                c => self.writer.u8(c),
            }
        }
    }

    pub fn write_arr(&mut self, items: &[EncodingData]) -> Result<(), JsonError> {
        self.writer.u8(b'[');
        let last = items.len().saturating_sub(1);
        for (i, item) in items.iter().enumerate() {
            self.write_any(item)?;
            if i < last {
                self.writer.u8(b',');
            }
        }
        self.writer.u8(b']');
        Ok(())
    }

    pub fn write_obj(&mut self, pairs: &[(EncodingData, EncodingData)]) -> Result<(), JsonError> {
        self.writer.u8(b'{');
        let last = pairs.len().saturating_sub(1);
        for (i, (key, value)) in pairs.iter().enumerate() {
            match key {
                EncodingData::Str(s) => self.write_str(s),
                EncodingData::BinaryStr(b) => self.write_binary_str(b),
                other => return Err(JsonError::InvalidKey(other.kind())),
            }
            self.writer.u8(b':');
            self.write_any(value)?;
            if i < last {
                self.writer.u8(b',');
            }
        }
        self.writer.u8(b'}');
        Ok(())
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "null".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "1e308".to_string()
        } else {
            "-1e308".to_string()
        }
    } else if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &EncodingData) -> String {
        let bytes = JsonEncoder::new().encode(value).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(encode(&EncodingData::Absent), "null");
        assert_eq!(encode(&EncodingData::Bool(true)), "true");
        assert_eq!(encode(&EncodingData::Uint(u64::MAX)), "18446744073709551615");
        assert_eq!(encode(&EncodingData::Int(-3)), "-3");
        assert_eq!(encode(&EncodingData::Float(1.5)), "1.5");
        assert_eq!(encode(&EncodingData::Float(3.0)), "3");
    }

    #[test]
    fn string_escaping() {
        assert_eq!(
            encode(&EncodingData::Str("a\"b\\c\nd\u{1}".into())),
            "\"a\\\"b\\\\c\\nd\\u0001\""
        );
        assert_eq!(encode(&EncodingData::Str("héllo".into())), "\"héllo\"");
    }

    #[test]
    fn bytes_as_base64() {
        assert_eq!(
            encode(&EncodingData::Bytes(vec![255, 255, 0])),
            "\"//8A\""
        );
    }

    #[test]
    fn binary_str_surrogate_escapes() {
        assert_eq!(
            encode(&EncodingData::BinaryStr(vec![b'a', 0xff, b'b'])),
            "\"a\\udcffb\""
        );
        // All-valid payloads come out as plain text.
        assert_eq!(
            encode(&EncodingData::BinaryStr(b"plain".to_vec())),
            "\"plain\""
        );
    }

    #[test]
    fn objects_and_arrays() {
        let value = EncodingData::map_from_entries([
            ("a", EncodingData::Uint(123)),
            ("b", EncodingData::Str("test".into())),
            ("c", EncodingData::Bytes(vec![255, 255, 0])),
        ]);
        assert_eq!(encode(&value), "{\"a\":123,\"b\":\"test\",\"c\":\"//8A\"}");
        assert_eq!(encode(&EncodingData::List(vec![])), "[]");
        assert_eq!(encode(&EncodingData::Map(vec![])), "{}");
    }
}
