//! `RawStringProvider` — path-scoped reader over an encoded buffer.
//!
//! Schema-level decode turns str payloads into Rust strings, which is lossy
//! when the payload was never valid UTF-8. Some callers need the exact bytes
//! the wire carried, for instance to recompute a hash over them. The provider
//! re-parses the original buffer lazily: descending into a map value or array
//! element only records the path; nothing is decoded until a leaf is asked
//! for.
//!
//! All descended providers share the same buffer slice. Navigation never
//! copies or mutates it.

use super::decoder::MsgpackDecoder;
use super::error::MsgpackError;
use crate::data::EncodingData;

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    MapKey(EncodingData),
    ArrayIndex(usize),
}

#[derive(Debug, Clone)]
pub struct RawStringProvider<'a> {
    data: &'a [u8],
    path: Vec<PathSegment>,
}

impl<'a> RawStringProvider<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, path: Vec::new() }
    }

    /// A provider scoped to the value under `key` in the map at the current
    /// path. The key is not checked until a leaf read happens.
    pub fn with_map_value(&self, key: EncodingData) -> Self {
        let mut path = self.path.clone();
        path.push(PathSegment::MapKey(key));
        Self { data: self.data, path }
    }

    /// A provider scoped to the element at `index` in the array at the
    /// current path.
    pub fn with_array_element(&self, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(PathSegment::ArrayIndex(index));
        Self { data: self.data, path }
    }

    /// Renders the navigation path for error messages.
    pub fn path_description(&self) -> String {
        let mut description = String::from("root");
        for segment in &self.path {
            match segment {
                PathSegment::MapKey(key) => {
                    description.push_str(" -> map key ");
                    match key {
                        EncodingData::Str(s) => {
                            description.push('"');
                            description.push_str(s);
                            description.push('"');
                        }
                        EncodingData::BinaryStr(b) => {
                            description.push('"');
                            description.push_str(&String::from_utf8_lossy(b));
                            description.push('"');
                        }
                        EncodingData::Uint(u) => description.push_str(&u.to_string()),
                        EncodingData::Int(i) => description.push_str(&i.to_string()),
                        other => description.push_str(other.kind()),
                    }
                }
                PathSegment::ArrayIndex(index) => {
                    description.push_str(" -> array element ");
                    description.push_str(&index.to_string());
                }
            }
        }
        description
    }

    fn seek(&self) -> Result<MsgpackDecoder<'a>, MsgpackError> {
        let mut decoder = MsgpackDecoder::new(self.data);
        for segment in &self.path {
            match segment {
                PathSegment::MapKey(key) => decoder.find_map_value(key)?,
                PathSegment::ArrayIndex(index) => decoder.find_index(*index)?,
            }
        }
        Ok(decoder)
    }

    /// The untouched payload bytes of the str-typed leaf at the current
    /// path. Fails with the wire kind actually found when the leaf is not
    /// str-typed.
    pub fn raw_string_at_current_location(&self) -> Result<&'a [u8], MsgpackError> {
        let mut decoder = self.seek()?;
        let found = decoder.peek_kind()?;
        if found != "string" {
            return Err(MsgpackError::ExpectedRawString {
                path: self.path_description(),
                found,
            });
        }
        decoder.read_raw_str()
    }

    /// The map at the current path, with keys decoded to plain byte
    /// sequences and str-typed values left as undecoded [`EncodingData::BinaryStr`]
    /// markers.
    pub fn raw_map_at_current_location(
        &self,
    ) -> Result<Vec<(Vec<u8>, EncodingData)>, MsgpackError> {
        let mut decoder = self.seek()?;
        let found = decoder.peek_kind()?;
        if found != "map" {
            return Err(MsgpackError::ExpectedMap {
                path: self.path_description(),
                found,
            });
        }
        let size = decoder.read_map_hdr()?;
        let mut entries = Vec::with_capacity(size);
        for _ in 0..size {
            let key = match decoder.read_any_raw_strings()? {
                EncodingData::BinaryStr(bytes) | EncodingData::Bytes(bytes) => bytes,
                other => return Err(MsgpackError::InvalidKey(other.kind())),
            };
            let value = decoder.read_any_raw_strings()?;
            entries.push((key, value));
        }
        Ok(entries)
    }
}
