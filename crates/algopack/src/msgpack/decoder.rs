//! `MsgpackDecoder` — lenient MessagePack decoder and cursor.
//!
//! Decode is lenient where encode is strict: any integer width, any header
//! width, and str payloads that are not valid UTF-8 are all accepted, because
//! this codec must read data produced by other implementations of the
//! reference protocol. Invalid UTF-8 in a str payload decodes to a
//! replacement-character string; callers that need the untouched bytes go
//! through [`super::RawStringProvider`] instead.
//!
//! The decoder doubles as the low-level cursor for the raw string provider:
//! it can skip values, read headers, and seek to a map key or array index
//! without decoding anything it passes over.

use algopack_buffers::Reader;

use super::constants::*;
use super::error::MsgpackError;
use crate::data::EncodingData;

pub struct MsgpackDecoder<'a> {
    pub reader: Reader<'a>,
}

impl<'a> MsgpackDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
        }
    }

    /// Decodes a complete msgpack value, rejecting trailing bytes.
    pub fn decode(data: &'a [u8]) -> Result<EncodingData, MsgpackError> {
        let mut decoder = Self::new(data);
        let value = decoder.read_any()?;
        if !decoder.reader.is_empty() {
            return Err(MsgpackError::TrailingData);
        }
        Ok(value)
    }

    #[inline]
    fn u8(&mut self) -> Result<u8, MsgpackError> {
        self.reader.u8().ok_or(MsgpackError::UnexpectedEof)
    }

    #[inline]
    fn u16(&mut self) -> Result<u16, MsgpackError> {
        self.reader.u16().ok_or(MsgpackError::UnexpectedEof)
    }

    #[inline]
    fn u32(&mut self) -> Result<u32, MsgpackError> {
        self.reader.u32().ok_or(MsgpackError::UnexpectedEof)
    }

    #[inline]
    fn u64(&mut self) -> Result<u64, MsgpackError> {
        self.reader.u64().ok_or(MsgpackError::UnexpectedEof)
    }

    #[inline]
    fn buf(&mut self, size: usize) -> Result<&'a [u8], MsgpackError> {
        self.reader.buf(size).ok_or(MsgpackError::UnexpectedEof)
    }

    pub fn read_any(&mut self) -> Result<EncodingData, MsgpackError> {
        self.read_value(false)
    }

    /// Like [`read_any`](Self::read_any), but every str-typed payload is
    /// returned as an undecoded [`EncodingData::BinaryStr`] marker. Used by
    /// the raw string provider so that no byte is lost to replacement
    /// characters.
    pub fn read_any_raw_strings(&mut self) -> Result<EncodingData, MsgpackError> {
        self.read_value(true)
    }

    fn read_value(&mut self, raw_strings: bool) -> Result<EncodingData, MsgpackError> {
        let offset = self.reader.x;
        let byte = self.u8()?;

        // positive fixint
        if byte <= 0x7f {
            return Ok(EncodingData::Uint(byte as u64));
        }
        // negative fixint
        if byte >= 0xe0 {
            return Ok(EncodingData::Int(byte as i8 as i64));
        }
        // fixmap
        if (0x80..=0x8f).contains(&byte) {
            return self.read_map_entries((byte & 0xf) as usize, raw_strings);
        }
        // fixarray
        if (0x90..=0x9f).contains(&byte) {
            return self.read_arr_items((byte & 0xf) as usize, raw_strings);
        }
        // fixstr
        if (0xa0..=0xbf).contains(&byte) {
            let n = (byte & 0x1f) as usize;
            return self.read_str_payload(n, raw_strings);
        }

        match byte {
            NIL => Ok(EncodingData::Absent),
            FALSE => Ok(EncodingData::Bool(false)),
            TRUE => Ok(EncodingData::Bool(true)),
            BIN8 => {
                let n = self.u8()? as usize;
                Ok(EncodingData::Bytes(self.buf(n)?.to_vec()))
            }
            BIN16 => {
                let n = self.u16()? as usize;
                Ok(EncodingData::Bytes(self.buf(n)?.to_vec()))
            }
            BIN32 => {
                let n = self.u32()? as usize;
                Ok(EncodingData::Bytes(self.buf(n)?.to_vec()))
            }
            FLOAT32 => {
                let bits = self.u32()?;
                Ok(EncodingData::Float(f32::from_bits(bits) as f64))
            }
            FLOAT64 => {
                let bits = self.u64()?;
                Ok(EncodingData::Float(f64::from_bits(bits)))
            }
            UINT8 => Ok(EncodingData::Uint(self.u8()? as u64)),
            UINT16 => Ok(EncodingData::Uint(self.u16()? as u64)),
            UINT32 => Ok(EncodingData::Uint(self.u32()? as u64)),
            UINT64 => Ok(EncodingData::Uint(self.u64()?)),
            INT8 => {
                let v = self.u8()? as i8 as i64;
                Ok(int_or_uint(v))
            }
            INT16 => {
                let v = self.u16()? as i16 as i64;
                Ok(int_or_uint(v))
            }
            INT32 => {
                let v = self.u32()? as i32 as i64;
                Ok(int_or_uint(v))
            }
            INT64 => {
                let v = self.u64()? as i64;
                Ok(int_or_uint(v))
            }
            STR8 => {
                let n = self.u8()? as usize;
                self.read_str_payload(n, raw_strings)
            }
            STR16 => {
                let n = self.u16()? as usize;
                self.read_str_payload(n, raw_strings)
            }
            STR32 => {
                let n = self.u32()? as usize;
                self.read_str_payload(n, raw_strings)
            }
            ARR16 => {
                let n = self.u16()? as usize;
                self.read_arr_items(n, raw_strings)
            }
            ARR32 => {
                let n = self.u32()? as usize;
                self.read_arr_items(n, raw_strings)
            }
            MAP16 => {
                let n = self.u16()? as usize;
                self.read_map_entries(n, raw_strings)
            }
            MAP32 => {
                let n = self.u32()? as usize;
                self.read_map_entries(n, raw_strings)
            }
            _ => Err(MsgpackError::InvalidByte { byte, offset }),
        }
    }

    fn read_str_payload(
        &mut self,
        size: usize,
        raw_strings: bool,
    ) -> Result<EncodingData, MsgpackError> {
        let slice = self.buf(size)?;
        if raw_strings {
            return Ok(EncodingData::BinaryStr(slice.to_vec()));
        }
        Ok(EncodingData::Str(
            String::from_utf8_lossy(slice).into_owned(),
        ))
    }

    fn read_arr_items(
        &mut self,
        size: usize,
        raw_strings: bool,
    ) -> Result<EncodingData, MsgpackError> {
        let mut items = Vec::with_capacity(size);
        for _ in 0..size {
            items.push(self.read_value(raw_strings)?);
        }
        Ok(EncodingData::List(items))
    }

    fn read_map_entries(
        &mut self,
        size: usize,
        raw_strings: bool,
    ) -> Result<EncodingData, MsgpackError> {
        let mut pairs = Vec::with_capacity(size);
        for _ in 0..size {
            let key = self.read_value(raw_strings)?;
            let value = self.read_value(raw_strings)?;
            pairs.push((key, value));
        }
        Ok(EncodingData::Map(pairs))
    }

    // ---- cursor primitives ----

    /// Wire kind of the value at the cursor, for error messages.
    pub fn peek_kind(&self) -> Result<&'static str, MsgpackError> {
        let byte = self.reader.peek().ok_or(MsgpackError::UnexpectedEof)?;
        Ok(match byte {
            0x00..=0x7f | 0xe0..=0xff | UINT8..=UINT64 | INT8..=INT64 => "integer",
            0x80..=0x8f | MAP16 | MAP32 => "map",
            0x90..=0x9f | ARR16 | ARR32 => "array",
            0xa0..=0xbf | STR8..=STR32 => "string",
            NIL => "nil",
            FALSE | TRUE => "boolean",
            BIN8..=BIN32 => "bytes",
            FLOAT32 | FLOAT64 => "float",
            _ => "unknown",
        })
    }

    /// Skips one value, returning how many bytes it occupied.
    pub fn skip_any(&mut self) -> Result<usize, MsgpackError> {
        let start = self.reader.x;
        let byte = self.u8()?;

        if byte <= 0x7f || byte >= 0xe0 {
            return Ok(self.reader.x - start);
        }
        if (0x80..=0x8f).contains(&byte) {
            self.skip_map_entries((byte & 0xf) as usize)?;
            return Ok(self.reader.x - start);
        }
        if (0x90..=0x9f).contains(&byte) {
            self.skip_arr_items((byte & 0xf) as usize)?;
            return Ok(self.reader.x - start);
        }
        if (0xa0..=0xbf).contains(&byte) {
            self.buf((byte & 0x1f) as usize)?;
            return Ok(self.reader.x - start);
        }

        match byte {
            NIL | FALSE | TRUE => {}
            BIN8 | STR8 => {
                let n = self.u8()? as usize;
                self.buf(n)?;
            }
            BIN16 | STR16 => {
                let n = self.u16()? as usize;
                self.buf(n)?;
            }
            BIN32 | STR32 => {
                let n = self.u32()? as usize;
                self.buf(n)?;
            }
            FLOAT32 | UINT32 | INT32 => {
                self.buf(4)?;
            }
            FLOAT64 | UINT64 | INT64 => {
                self.buf(8)?;
            }
            UINT8 | INT8 => {
                self.buf(1)?;
            }
            UINT16 | INT16 => {
                self.buf(2)?;
            }
            ARR16 => {
                let n = self.u16()? as usize;
                self.skip_arr_items(n)?;
            }
            ARR32 => {
                let n = self.u32()? as usize;
                self.skip_arr_items(n)?;
            }
            MAP16 => {
                let n = self.u16()? as usize;
                self.skip_map_entries(n)?;
            }
            MAP32 => {
                let n = self.u32()? as usize;
                self.skip_map_entries(n)?;
            }
            _ => {
                return Err(MsgpackError::InvalidByte {
                    byte,
                    offset: start,
                })
            }
        }
        Ok(self.reader.x - start)
    }

    fn skip_arr_items(&mut self, size: usize) -> Result<(), MsgpackError> {
        for _ in 0..size {
            self.skip_any()?;
        }
        Ok(())
    }

    fn skip_map_entries(&mut self, size: usize) -> Result<(), MsgpackError> {
        for _ in 0..size {
            self.skip_any()?;
            self.skip_any()?;
        }
        Ok(())
    }

    pub fn read_map_hdr(&mut self) -> Result<usize, MsgpackError> {
        let byte = self.u8()?;
        if byte >> 4 == 0b1000 {
            return Ok((byte & 0xf) as usize);
        }
        match byte {
            MAP16 => Ok(self.u16()? as usize),
            MAP32 => Ok(self.u32()? as usize),
            _ => Err(MsgpackError::NotMap),
        }
    }

    pub fn read_arr_hdr(&mut self) -> Result<usize, MsgpackError> {
        let byte = self.u8()?;
        if byte >> 4 == 0b1001 {
            return Ok((byte & 0xf) as usize);
        }
        match byte {
            ARR16 => Ok(self.u16()? as usize),
            ARR32 => Ok(self.u32()? as usize),
            _ => Err(MsgpackError::NotArr),
        }
    }

    pub fn read_str_hdr(&mut self) -> Result<usize, MsgpackError> {
        let byte = self.u8()?;
        if byte >> 5 == 0b101 {
            return Ok((byte & 0x1f) as usize);
        }
        match byte {
            STR8 => Ok(self.u8()? as usize),
            STR16 => Ok(self.u16()? as usize),
            STR32 => Ok(self.u32()? as usize),
            _ => Err(MsgpackError::NotStr),
        }
    }

    /// Reads a str-typed value and returns its untouched payload bytes.
    pub fn read_raw_str(&mut self) -> Result<&'a [u8], MsgpackError> {
        let size = self.read_str_hdr()?;
        self.buf(size)
    }

    /// Seeks the cursor to the map value stored under `key`. The map header
    /// must be at the current cursor position.
    pub fn find_map_value(&mut self, key: &EncodingData) -> Result<(), MsgpackError> {
        let size = self.read_map_hdr()?;
        for _ in 0..size {
            let current = self.read_any_raw_strings()?;
            if keys_match(&current, key) {
                return Ok(());
            }
            self.skip_any()?;
        }
        Err(MsgpackError::KeyNotFound(format!("{key:?}")))
    }

    /// Seeks the cursor to the array element at `index`. The array header
    /// must be at the current cursor position.
    pub fn find_index(&mut self, index: usize) -> Result<(), MsgpackError> {
        let size = self.read_arr_hdr()?;
        if index >= size {
            return Err(MsgpackError::IndexOutOfBounds {
                index,
                length: size,
            });
        }
        for _ in 0..index {
            self.skip_any()?;
        }
        Ok(())
    }
}

fn int_or_uint(value: i64) -> EncodingData {
    if value >= 0 {
        EncodingData::Uint(value as u64)
    } else {
        EncodingData::Int(value)
    }
}

/// Compares a wire map key (str payloads as `BinaryStr`) against a wanted
/// key, unifying the string representations by byte content.
pub(crate) fn keys_match(wire: &EncodingData, want: &EncodingData) -> bool {
    match (wire, want) {
        (EncodingData::BinaryStr(w), EncodingData::Str(s)) => w.as_slice() == s.as_bytes(),
        (EncodingData::Str(w), EncodingData::BinaryStr(b)) => w.as_bytes() == b.as_slice(),
        (EncodingData::BinaryStr(w), EncodingData::BinaryStr(b)) => w == b,
        (EncodingData::Uint(w), EncodingData::Int(i)) => {
            i64::try_from(*w).is_ok_and(|w| w == *i)
        }
        (EncodingData::Int(w), EncodingData::Uint(u)) => {
            u64::try_from(*w).is_ok_and(|w| w == *u)
        }
        (a, b) => a == b,
    }
}
