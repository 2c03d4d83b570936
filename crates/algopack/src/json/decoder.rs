//! `JsonDecoder` — JSON decoder that produces `EncodingData`.
//!
//! The tokenizer walks the JSON grammar over raw bytes. Integer literals
//! (no decimal point, no exponent) are captured as digit strings and
//! converted per the active [`IntDecoding`] mode; they never pass through an
//! `f64`, so values above 2^53 - 1 keep full precision. Literals with a
//! point or exponent always decode as `Float`.
//!
//! Unpaired `\udcXX` low-surrogate escapes inside strings decode to the raw
//! byte `XX`; a string containing any such escape yields
//! [`EncodingData::BinaryStr`] with the exact original bytes. This is the
//! inverse of the lossy conversion the encoder applies to invalid UTF-8.

use super::error::JsonError;
use crate::data::EncodingData;
use crate::int_decoding::{IntDecoding, MAX_SAFE_INTEGER};
use crate::uint64::apply_int_decoding;

pub struct JsonDecoder<'a> {
    pub data: &'a [u8],
    pub x: usize,
    pub int_decoding: IntDecoding,
}

impl<'a> JsonDecoder<'a> {
    pub fn new(data: &'a [u8], int_decoding: IntDecoding) -> Self {
        Self {
            data,
            x: 0,
            int_decoding,
        }
    }

    /// Decodes a complete JSON document, rejecting trailing characters.
    pub fn decode(text: &'a str, int_decoding: IntDecoding) -> Result<EncodingData, JsonError> {
        let mut decoder = Self::new(text.as_bytes(), int_decoding);
        let value = decoder.read_any()?;
        decoder.skip_whitespace();
        if decoder.x != decoder.data.len() {
            return Err(JsonError::TrailingData);
        }
        Ok(value)
    }

    pub fn read_any(&mut self) -> Result<EncodingData, JsonError> {
        self.skip_whitespace();
        let x = self.x;
        if x >= self.data.len() {
            return Err(JsonError::Invalid(x));
        }
        match self.data[x] {
            b'"' => self.read_str(),
            b'[' => self.read_arr(),
            b'{' => self.read_obj(),
            b't' => self.read_true(),
            b'f' => self.read_false(),
            b'n' => self.read_null(),
            c if c.is_ascii_digit() || c == b'-' => self.read_num(),
            _ => Err(JsonError::Invalid(x)),
        }
    }

    pub fn skip_whitespace(&mut self) {
        while self.x < self.data.len() {
            match self.data[self.x] {
                b' ' | b'\t' | b'\n' | b'\r' => self.x += 1,
                _ => break,
            }
        }
    }

    fn read_literal(
        &mut self,
        literal: &'static [u8],
        value: EncodingData,
    ) -> Result<EncodingData, JsonError> {
        if self.x + literal.len() > self.data.len()
            || &self.data[self.x..self.x + literal.len()] != literal
        {
            return Err(JsonError::Invalid(self.x));
        }
        self.x += literal.len();
        Ok(value)
    }

    pub fn read_null(&mut self) -> Result<EncodingData, JsonError> {
        self.read_literal(b"null", EncodingData::Absent)
    }

    pub fn read_true(&mut self) -> Result<EncodingData, JsonError> {
        self.read_literal(b"true", EncodingData::Bool(true))
    }

    pub fn read_false(&mut self) -> Result<EncodingData, JsonError> {
        self.read_literal(b"false", EncodingData::Bool(false))
    }

    pub fn read_num(&mut self) -> Result<EncodingData, JsonError> {
        let start = self.x;
        let data = self.data;
        let len = data.len();
        let mut x = self.x;

        let negative = x < len && data[x] == b'-';
        if negative {
            x += 1;
        }
        let digits_start = x;
        while x < len && data[x].is_ascii_digit() {
            x += 1;
        }
        if x == digits_start {
            return Err(JsonError::Invalid(start));
        }
        // The grammar allows a lone zero but no other leading zero.
        if data[digits_start] == b'0' && x - digits_start > 1 {
            return Err(JsonError::Invalid(digits_start));
        }
        let mut is_float = false;
        if x < len && data[x] == b'.' {
            is_float = true;
            x += 1;
            let frac_start = x;
            while x < len && data[x].is_ascii_digit() {
                x += 1;
            }
            if x == frac_start {
                return Err(JsonError::Invalid(x));
            }
        }
        if x < len && (data[x] == b'e' || data[x] == b'E') {
            is_float = true;
            x += 1;
            if x < len && (data[x] == b'+' || data[x] == b'-') {
                x += 1;
            }
            let exp_start = x;
            while x < len && data[x].is_ascii_digit() {
                x += 1;
            }
            if x == exp_start {
                return Err(JsonError::Invalid(x));
            }
        }
        self.x = x;

        // The slice is ASCII by construction.
        let literal = std::str::from_utf8(&data[start..x]).map_err(|_| JsonError::InvalidUtf8)?;
        if is_float {
            let f: f64 = literal.parse().map_err(|_| JsonError::Invalid(start))?;
            return Ok(EncodingData::Float(f));
        }
        if negative {
            return match literal.parse::<i64>() {
                Ok(int) => decode_negative(int, self.int_decoding)
                    .ok_or_else(|| JsonError::IntegerOutOfRange(literal.to_string())),
                Err(_) => self.out_of_range(literal),
            };
        }
        match literal.parse::<u64>() {
            Ok(uint) => Ok(apply_int_decoding(uint, self.int_decoding)?),
            Err(_) => self.out_of_range(literal),
        }
    }

    /// An integer literal the u64/i64 tree domain cannot hold. In unsafe
    /// mode it truncates to a float like any other integer; the exact modes
    /// refuse it.
    fn out_of_range(&self, literal: &str) -> Result<EncodingData, JsonError> {
        if self.int_decoding == IntDecoding::Unsafe {
            let f: f64 = literal
                .parse()
                .map_err(|_| JsonError::IntegerOutOfRange(literal.to_string()))?;
            return Ok(EncodingData::Float(f));
        }
        Err(JsonError::IntegerOutOfRange(literal.to_string()))
    }

    /// Reads a quoted string. Produces `Str` for ordinary strings and
    /// `BinaryStr` when the string carries `\udcXX` raw-byte escapes.
    pub fn read_str(&mut self) -> Result<EncodingData, JsonError> {
        let start = self.x;
        if start >= self.data.len() || self.data[start] != b'"' {
            return Err(JsonError::Invalid(start));
        }
        self.x += 1;
        let mut out: Vec<u8> = Vec::new();
        let mut has_raw_bytes = false;
        loop {
            let x = self.x;
            if x >= self.data.len() {
                return Err(JsonError::UnterminatedString(start));
            }
            match self.data[x] {
                b'"' => {
                    self.x += 1;
                    break;
                }
                b'\\' => {
                    if self.read_escape(&mut out)? {
                        has_raw_bytes = true;
                    }
                }
                c if c < 0x20 => return Err(JsonError::Invalid(x)),
                c => {
                    out.push(c);
                    self.x += 1;
                }
            }
        }
        if has_raw_bytes {
            return Ok(EncodingData::BinaryStr(out));
        }
        let s = String::from_utf8(out).map_err(|_| JsonError::InvalidUtf8)?;
        Ok(EncodingData::Str(s))
    }

    /// Consumes one backslash escape, appending its bytes to `out`. Returns
    /// true when the escape was an unpaired low surrogate carrying a raw
    /// byte.
    fn read_escape(&mut self, out: &mut Vec<u8>) -> Result<bool, JsonError> {
        let start = self.x;
        self.x += 1; // backslash
        let ch = *self
            .data
            .get(self.x)
            .ok_or(JsonError::UnterminatedString(start))?;
        self.x += 1;
        let simple = match ch {
            b'"' => Some(b'"'),
            b'\\' => Some(b'\\'),
            b'/' => Some(b'/'),
            b'b' => Some(0x08),
            b'f' => Some(0x0c),
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'u' => None,
            _ => return Err(JsonError::InvalidEscape(start)),
        };
        if let Some(byte) = simple {
            out.push(byte);
            return Ok(false);
        }
        let unit = self.read_hex4(start)?;
        if (0xd800..=0xdbff).contains(&unit) {
            // High surrogate: must pair with a following \u low surrogate.
            if self.data.get(self.x) != Some(&b'\\') || self.data.get(self.x + 1) != Some(&b'u') {
                return Err(JsonError::InvalidEscape(start));
            }
            self.x += 2;
            let low = self.read_hex4(start)?;
            if !(0xdc00..=0xdfff).contains(&low) {
                return Err(JsonError::InvalidEscape(start));
            }
            let code = 0x10000 + ((unit - 0xd800) << 10) + (low - 0xdc00);
            let ch = char::from_u32(code).ok_or(JsonError::InvalidEscape(start))?;
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            return Ok(false);
        }
        if (0xdc80..=0xdcff).contains(&unit) {
            // Unpaired low surrogate carrying a raw byte.
            out.push((unit & 0xff) as u8);
            return Ok(true);
        }
        if (0xdc00..=0xdfff).contains(&unit) {
            return Err(JsonError::InvalidEscape(start));
        }
        let ch = char::from_u32(unit).ok_or(JsonError::InvalidEscape(start))?;
        let mut buf = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        Ok(false)
    }

    fn read_hex4(&mut self, escape_start: usize) -> Result<u32, JsonError> {
        if self.x + 4 > self.data.len() {
            return Err(JsonError::UnterminatedString(escape_start));
        }
        let mut unit: u32 = 0;
        for _ in 0..4 {
            let digit = (self.data[self.x] as char)
                .to_digit(16)
                .ok_or(JsonError::InvalidEscape(escape_start))?;
            unit = unit << 4 | digit;
            self.x += 1;
        }
        Ok(unit)
    }

    pub fn read_arr(&mut self) -> Result<EncodingData, JsonError> {
        self.x += 1; // opening bracket, checked by read_any
        let mut items = Vec::new();
        let mut first = true;
        loop {
            self.skip_whitespace();
            if self.x >= self.data.len() {
                return Err(JsonError::Invalid(self.x));
            }
            match self.data[self.x] {
                b']' => {
                    self.x += 1;
                    return Ok(EncodingData::List(items));
                }
                b',' if !first => self.x += 1,
                _ if !first => return Err(JsonError::Invalid(self.x)),
                _ => {}
            }
            items.push(self.read_any()?);
            first = false;
        }
    }

    pub fn read_obj(&mut self) -> Result<EncodingData, JsonError> {
        self.x += 1; // opening brace, checked by read_any
        let mut pairs = Vec::new();
        let mut first = true;
        loop {
            self.skip_whitespace();
            if self.x >= self.data.len() {
                return Err(JsonError::Invalid(self.x));
            }
            match self.data[self.x] {
                b'}' => {
                    self.x += 1;
                    return Ok(EncodingData::Map(pairs));
                }
                b',' if !first => self.x += 1,
                _ if !first => return Err(JsonError::Invalid(self.x)),
                _ => {}
            }
            self.skip_whitespace();
            if self.x >= self.data.len() || self.data[self.x] != b'"' {
                return Err(JsonError::Invalid(self.x));
            }
            let key = self.read_str()?;
            self.skip_whitespace();
            if self.x >= self.data.len() || self.data[self.x] != b':' {
                return Err(JsonError::Invalid(self.x));
            }
            self.x += 1;
            let value = self.read_any()?;
            pairs.push((key, value));
            first = false;
        }
    }
}

fn decode_negative(int: i64, mode: IntDecoding) -> Option<EncodingData> {
    let safe = int.unsigned_abs() <= MAX_SAFE_INTEGER;
    match mode {
        IntDecoding::Unsafe => Some(EncodingData::Float(int as f64)),
        IntDecoding::Safe => {
            if safe {
                Some(EncodingData::Float(int as f64))
            } else {
                None
            }
        }
        IntDecoding::Mixed => {
            if safe {
                Some(EncodingData::Float(int as f64))
            } else {
                Some(EncodingData::Int(int))
            }
        }
        IntDecoding::Bigint => Some(EncodingData::Int(int)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> EncodingData {
        JsonDecoder::decode(text, IntDecoding::Bigint).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(decode("true"), EncodingData::Bool(true));
        assert_eq!(decode("false"), EncodingData::Bool(false));
        assert_eq!(decode("null"), EncodingData::Absent);
        assert_eq!(decode("42"), EncodingData::Uint(42));
        assert_eq!(decode("-7"), EncodingData::Int(-7));
        assert_eq!(decode("1.5"), EncodingData::Float(1.5));
        assert_eq!(decode("2e3"), EncodingData::Float(2000.0));
        assert_eq!(decode("\"hi\""), EncodingData::Str("hi".into()));
    }

    #[test]
    fn large_integers_keep_precision() {
        assert_eq!(
            decode("18446744073709551615"),
            EncodingData::Uint(u64::MAX)
        );
        assert_eq!(
            JsonDecoder::decode("18446744073709551616", IntDecoding::Bigint),
            Err(JsonError::IntegerOutOfRange(
                "18446744073709551616".to_string()
            ))
        );
    }

    #[test]
    fn unsafe_mode_truncates_beyond_u64() {
        // 2^64 does not fit the exact tree domain; unsafe mode still
        // produces a (lossy) float instead of an error.
        assert_eq!(
            JsonDecoder::decode("18446744073709551616", IntDecoding::Unsafe).unwrap(),
            EncodingData::Float(18446744073709551616.0)
        );
        assert_eq!(
            JsonDecoder::decode("-9223372036854775809", IntDecoding::Unsafe).unwrap(),
            EncodingData::Float(-9223372036854775809.0)
        );
    }

    #[test]
    fn number_grammar_is_strict() {
        for bad in ["007", "-01", "1.", "1.e3", "1e", "1e+", "-"] {
            assert!(
                JsonDecoder::decode(bad, IntDecoding::Bigint).is_err(),
                "accepted {bad:?}"
            );
        }
        assert_eq!(decode("0"), EncodingData::Uint(0));
        assert_eq!(decode("10"), EncodingData::Uint(10));
        assert_eq!(decode("0.5"), EncodingData::Float(0.5));
        assert_eq!(decode("1e+2"), EncodingData::Float(100.0));
    }

    #[test]
    fn int_decoding_modes() {
        let big = "9007199254740992"; // 2^53
        assert_eq!(
            JsonDecoder::decode(big, IntDecoding::Mixed).unwrap(),
            EncodingData::Uint(9007199254740992)
        );
        assert_eq!(
            JsonDecoder::decode("9007199254740991", IntDecoding::Mixed).unwrap(),
            EncodingData::Float(9007199254740991.0)
        );
        assert!(JsonDecoder::decode(big, IntDecoding::Safe).is_err());
        assert_eq!(
            JsonDecoder::decode(big, IntDecoding::Unsafe).unwrap(),
            EncodingData::Float(9007199254740992.0)
        );
    }

    #[test]
    fn surrogate_escape_yields_binary_str() {
        assert_eq!(
            decode("\"a\\udcffb\""),
            EncodingData::BinaryStr(vec![b'a', 0xff, b'b'])
        );
        // A proper surrogate pair is an ordinary character.
        assert_eq!(
            decode("\"\\ud83d\\ude00\""),
            EncodingData::Str("\u{1f600}".into())
        );
    }

    #[test]
    fn structures_and_nesting() {
        assert_eq!(
            decode("{\"a\": [1, {\"b\": null}]}"),
            EncodingData::map_from_entries([(
                "a",
                EncodingData::List(vec![
                    EncodingData::Uint(1),
                    EncodingData::map_from_entries([("b", EncodingData::Absent)]),
                ]),
            )])
        );
        assert_eq!(decode("[]"), EncodingData::List(vec![]));
        assert_eq!(decode("{}"), EncodingData::Map(vec![]));
    }

    #[test]
    fn trailing_data_rejected() {
        assert_eq!(
            JsonDecoder::decode("1 2", IntDecoding::Bigint),
            Err(JsonError::TrailingData)
        );
    }
}
