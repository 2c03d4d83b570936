//! [`EncodingData`] — the intermediate value tree shared by every schema and
//! wire codec in this crate.
//!
//! A schema's `prepare_*` methods lower a logical value into this tree, and
//! the wire encoders turn the tree into bytes. Decoding runs the same
//! pipeline in reverse.

/// Universal value tree for schema-driven encoding.
///
/// Two variants carry byte payloads: [`EncodingData::Bytes`] is emitted with
/// the binary wire type, while [`EncodingData::BinaryStr`] is emitted with
/// the string wire type even when the payload is not valid UTF-8. The
/// distinction is explicit in the tree and never inferred from content,
/// because the reference protocol encodes certain byte fields as strings and
/// their bytes must survive untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingData {
    /// An omitted/absent value (optional fields, untyped default).
    Absent,
    Bool(bool),
    /// Unsigned 64-bit integer. Always exact; never a float in disguise.
    Uint(u64),
    /// Negative integers only appear through the untyped passthrough.
    Int(i64),
    /// Floats only appear through the untyped passthrough.
    Float(f64),
    Str(String),
    /// Byte payload with the binary wire type.
    Bytes(Vec<u8>),
    /// Byte payload with the string wire type, valid UTF-8 or not.
    BinaryStr(Vec<u8>),
    List(Vec<EncodingData>),
    /// Ordered key/value pairs. Legal key kinds depend on the map schema in
    /// use and are enforced when the map is prepared or encoded.
    Map(Vec<(EncodingData, EncodingData)>),
}

impl EncodingData {
    /// Human-readable kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            EncodingData::Absent => "absent",
            EncodingData::Bool(_) => "boolean",
            EncodingData::Uint(_) => "uint",
            EncodingData::Int(_) => "int",
            EncodingData::Float(_) => "float",
            EncodingData::Str(_) => "string",
            EncodingData::Bytes(_) => "bytes",
            EncodingData::BinaryStr(_) => "binary string",
            EncodingData::List(_) => "list",
            EncodingData::Map(_) => "map",
        }
    }

    /// Builds a map from string-keyed pairs, the common case for structs.
    pub fn map_from_entries<I, S>(entries: I) -> EncodingData
    where
        I: IntoIterator<Item = (S, EncodingData)>,
        S: Into<String>,
    {
        EncodingData::Map(
            entries
                .into_iter()
                .map(|(k, v)| (EncodingData::Str(k.into()), v))
                .collect(),
        )
    }

    /// Looks up a string key in a map value.
    pub fn map_get(&self, key: &str) -> Option<&EncodingData> {
        match self {
            EncodingData::Map(pairs) => pairs.iter().find_map(|(k, v)| match k {
                EncodingData::Str(s) if s == key => Some(v),
                EncodingData::BinaryStr(b) if b.as_slice() == key.as_bytes() => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }
}
