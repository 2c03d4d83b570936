//! `MsgpackEncoder` — canonical MessagePack encoder.
//!
//! Canonical output is a hard requirement because some encoded bytes are
//! hashed or signed. The rules, matching the reference protocol:
//!
//! 1. every integer uses the smallest width that fits its magnitude;
//! 2. map keys are sorted ascending by their encoded bytes;
//! 3. non-negative integers always use the uint family;
//! 4. binary payloads use the bin wire type, string payloads the str wire
//!    type — [`EncodingData::BinaryStr`] uses str even for invalid UTF-8.

use algopack_buffers::Writer;

use super::constants::*;
use super::error::MsgpackError;
use crate::data::EncodingData;

pub struct MsgpackEncoder {
    pub writer: Writer,
}

impl Default for MsgpackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MsgpackEncoder {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(),
        }
    }

    pub fn encode(&mut self, value: &EncodingData) -> Result<Vec<u8>, MsgpackError> {
        self.writer.reset();
        self.write_any(value)?;
        Ok(self.writer.flush())
    }

    pub fn write_any(&mut self, value: &EncodingData) -> Result<(), MsgpackError> {
        match value {
            EncodingData::Absent => {
                self.writer.u8(NIL);
                Ok(())
            }
            EncodingData::Bool(b) => {
                self.writer.u8(if *b { TRUE } else { FALSE });
                Ok(())
            }
            EncodingData::Uint(u) => {
                self.write_uint(*u);
                Ok(())
            }
            EncodingData::Int(i) => {
                self.write_int(*i);
                Ok(())
            }
            EncodingData::Float(f) => {
                self.write_float(*f);
                Ok(())
            }
            EncodingData::Str(s) => {
                self.write_str_bytes(s.as_bytes());
                Ok(())
            }
            EncodingData::BinaryStr(b) => {
                self.write_str_bytes(b);
                Ok(())
            }
            EncodingData::Bytes(b) => {
                self.write_bin(b);
                Ok(())
            }
            EncodingData::List(items) => self.write_arr(items),
            EncodingData::Map(pairs) => self.write_map(pairs),
        }
    }

    /// Minimal-width unsigned integer.
    pub fn write_uint(&mut self, uint: u64) {
        if uint <= 0x7f {
            self.writer.u8(uint as u8);
        } else if uint <= 0xff {
            self.writer.u8(UINT8);
            self.writer.u8(uint as u8);
        } else if uint <= 0xffff {
            self.writer.u8u16(UINT16, uint as u16);
        } else if uint <= 0xffff_ffff {
            self.writer.u8u32(UINT32, uint as u32);
        } else {
            self.writer.u8u64(UINT64, uint);
        }
    }

    /// Minimal-width signed integer. Non-negative values take the uint path
    /// so that equal logical values always produce equal bytes.
    pub fn write_int(&mut self, int: i64) {
        if int >= 0 {
            self.write_uint(int as u64);
        } else if int >= -0x20 {
            self.writer.u8(int as u8);
        } else if int >= -0x80 {
            self.writer.u8(INT8);
            self.writer.u8(int as u8);
        } else if int >= -0x8000 {
            self.writer.u8u16(INT16, int as u16);
        } else if int >= -0x8000_0000 {
            self.writer.u8u32(INT32, int as u32);
        } else {
            self.writer.u8u64(INT64, int as u64);
        }
    }

    pub fn write_float(&mut self, float: f64) {
        self.writer.u8(FLOAT64);
        self.writer.u64(float.to_bits());
    }

    pub fn write_str_hdr(&mut self, length: usize) {
        if length <= 0x1f {
            self.writer.u8(0xa0 | length as u8);
        } else if length <= 0xff {
            self.writer.u8(STR8);
            self.writer.u8(length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(STR16, length as u16);
        } else {
            self.writer.u8u32(STR32, length as u32);
        }
    }

    /// Writes a str-typed payload. The payload is not required to be valid
    /// UTF-8; the reference protocol stores some raw byte fields this way.
    pub fn write_str_bytes(&mut self, bytes: &[u8]) {
        self.write_str_hdr(bytes.len());
        self.writer.buf(bytes);
    }

    pub fn write_bin_hdr(&mut self, length: usize) {
        if length <= 0xff {
            self.writer.u8(BIN8);
            self.writer.u8(length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(BIN16, length as u16);
        } else {
            self.writer.u8u32(BIN32, length as u32);
        }
    }

    pub fn write_bin(&mut self, buf: &[u8]) {
        self.write_bin_hdr(buf.len());
        self.writer.buf(buf);
    }

    pub fn write_arr_hdr(&mut self, length: usize) {
        if length <= 0xf {
            self.writer.u8(0x90 | length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(ARR16, length as u16);
        } else {
            self.writer.u8u32(ARR32, length as u32);
        }
    }

    pub fn write_arr(&mut self, items: &[EncodingData]) -> Result<(), MsgpackError> {
        self.write_arr_hdr(items.len());
        for item in items {
            self.write_any(item)?;
        }
        Ok(())
    }

    pub fn write_map_hdr(&mut self, length: usize) {
        if length <= 0xf {
            self.writer.u8(0x80 | length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(MAP16, length as u16);
        } else {
            self.writer.u8u32(MAP32, length as u32);
        }
    }

    /// Writes a map with entries sorted ascending by their encoded key
    /// bytes. Insertion order never reaches the wire.
    pub fn write_map(
        &mut self,
        pairs: &[(EncodingData, EncodingData)],
    ) -> Result<(), MsgpackError> {
        let mut encoded: Vec<(Vec<u8>, &EncodingData)> = Vec::with_capacity(pairs.len());
        let mut key_encoder = MsgpackEncoder::new();
        for (key, value) in pairs {
            match key {
                EncodingData::Uint(_)
                | EncodingData::Int(_)
                | EncodingData::Str(_)
                | EncodingData::Bytes(_)
                | EncodingData::BinaryStr(_) => {}
                other => return Err(MsgpackError::InvalidKey(other.kind())),
            }
            encoded.push((key_encoder.encode(key)?, value));
        }
        encoded.sort_by(|a, b| a.0.cmp(&b.0));
        for window in encoded.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(MsgpackError::DuplicateKey);
            }
        }
        self.write_map_hdr(encoded.len());
        for (key_bytes, value) in encoded {
            self.writer.buf(&key_bytes);
            self.write_any(value)?;
        }
        Ok(())
    }
}
