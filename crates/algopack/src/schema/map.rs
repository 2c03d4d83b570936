//! Struct-like named maps and the keyed-map schema variants.

use std::collections::HashSet;

use base64::prelude::{Engine, BASE64_STANDARD};

use super::{
    decode_base64, mismatch, prepare_binary_string_json, PrepareJsonOptions, Schema, SchemaError,
    ABSENT,
};
use crate::data::EncodingData;
use crate::msgpack::RawStringProvider;
use crate::uint64::ensure_uint64;

/// One declared field of a [`NamedMapSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMapEntry {
    /// Key of the entry. Must be unique within the flattened map.
    pub key: String,
    pub value_schema: Schema,
    /// Omit the key from the encoding when the value is the schema default.
    /// A non-omit-empty entry is required: its absence is a decode error.
    pub omit_empty: bool,
    /// Splice the fields of `value_schema` (which must be a named map, with
    /// an empty `key`) directly into the parent map.
    pub embedded: bool,
}

impl NamedMapEntry {
    /// An omit-empty entry, the common case for struct fields.
    pub fn new(key: impl Into<String>, value_schema: Schema) -> Self {
        Self {
            key: key.into(),
            value_schema,
            omit_empty: true,
            embedded: false,
        }
    }

    /// Marks the entry required: it is always encoded and must be present
    /// when decoding.
    pub fn required(mut self) -> Self {
        self.omit_empty = false;
        self
    }

    /// An embedded entry whose named-map fields are flattened into the
    /// parent.
    pub fn embedded(value_schema: Schema) -> Self {
        Self {
            key: String::new(),
            value_schema,
            omit_empty: false,
            embedded: true,
        }
    }
}

/// Schema for a map with a fixed set of declared string keys.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMapSchema {
    entries: Vec<NamedMapEntry>,
}

impl NamedMapSchema {
    /// Validates eagerly: embedded entries must have an empty key and a
    /// named-map value schema, and flattening must not produce duplicate
    /// keys.
    pub fn new(entries: Vec<NamedMapEntry>) -> Result<Self, SchemaError> {
        let schema = Self { entries };
        schema.check_entries()?;
        Ok(schema)
    }

    fn check_entries(&self) -> Result<(), SchemaError> {
        for entry in &self.entries {
            if entry.embedded {
                if !entry.key.is_empty() {
                    return Err(SchemaError::EmbeddedKeyNotEmpty);
                }
                if !matches!(entry.value_schema, Schema::NamedMap(_)) {
                    return Err(SchemaError::EmbeddedValueNotNamedMap);
                }
            }
        }
        let mut keys = HashSet::new();
        for entry in self.entries() {
            if !keys.insert(entry.key.as_str()) {
                return Err(SchemaError::DuplicateKey(entry.key.clone()));
            }
        }
        Ok(())
    }

    /// All top-level entries, with embedded entries' fields spliced in at
    /// their position.
    pub fn entries(&self) -> Vec<&NamedMapEntry> {
        let mut flattened = Vec::new();
        for entry in &self.entries {
            if entry.embedded {
                if let Schema::NamedMap(inner) = &entry.value_schema {
                    flattened.extend(inner.entries());
                }
            } else {
                flattened.push(entry);
            }
        }
        flattened
    }

    pub fn default_value(&self) -> EncodingData {
        EncodingData::Map(
            self.entries()
                .into_iter()
                .map(|entry| {
                    (
                        EncodingData::Str(entry.key.clone()),
                        entry.value_schema.default_value(),
                    )
                })
                .collect(),
        )
    }

    pub fn is_default_value(&self, data: &EncodingData) -> bool {
        if !matches!(data, EncodingData::Map(_)) {
            return false;
        }
        self.entries().into_iter().all(|entry| {
            let value = data.map_get(&entry.key).unwrap_or(&ABSENT);
            entry.value_schema.is_default_value(value)
        })
    }

    pub fn prepare_msgpack(&self, data: &EncodingData) -> Result<EncodingData, SchemaError> {
        self.prepare(data, |entry, value| entry.value_schema.prepare_msgpack(value))
    }

    pub fn prepare_json(
        &self,
        data: &EncodingData,
        options: &PrepareJsonOptions,
    ) -> Result<EncodingData, SchemaError> {
        self.prepare(data, |entry, value| {
            entry.value_schema.prepare_json(value, options)
        })
    }

    /// Canonicalizing prepare shared by both wire formats: declared entries
    /// only (unknown input keys are ignored), with omit-empty entries
    /// dropped when their value equals the schema default.
    fn prepare<F>(&self, data: &EncodingData, prepare_value: F) -> Result<EncodingData, SchemaError>
    where
        F: Fn(&NamedMapEntry, &EncodingData) -> Result<EncodingData, SchemaError>,
    {
        if !matches!(data, EncodingData::Map(_)) {
            return Err(mismatch("named map", data));
        }
        let mut pairs = Vec::new();
        for entry in self.entries() {
            let value = data.map_get(&entry.key).unwrap_or(&ABSENT);
            if entry.omit_empty && entry.value_schema.is_default_value(value) {
                continue;
            }
            pairs.push((
                EncodingData::Str(entry.key.clone()),
                prepare_value(entry, value)?,
            ));
        }
        Ok(EncodingData::Map(pairs))
    }

    pub fn from_prepared_msgpack(
        &self,
        encoded: &EncodingData,
        provider: &RawStringProvider<'_>,
    ) -> Result<EncodingData, SchemaError> {
        self.from_prepared(encoded, |entry, value| {
            entry.value_schema.from_prepared_msgpack(
                value,
                &provider.with_map_value(EncodingData::Str(entry.key.clone())),
            )
        })
    }

    pub fn from_prepared_json(&self, encoded: &EncodingData) -> Result<EncodingData, SchemaError> {
        self.from_prepared(encoded, |entry, value| {
            entry.value_schema.from_prepared_json(value)
        })
    }

    /// Decode shared by both wire formats: omitted omit-empty entries are
    /// restored to their schema default; a missing required entry is an
    /// error.
    fn from_prepared<F>(
        &self,
        encoded: &EncodingData,
        from_prepared_value: F,
    ) -> Result<EncodingData, SchemaError>
    where
        F: Fn(&NamedMapEntry, &EncodingData) -> Result<EncodingData, SchemaError>,
    {
        if !matches!(encoded, EncodingData::Map(_)) {
            return Err(mismatch("named map", encoded));
        }
        let mut pairs = Vec::new();
        for entry in self.entries() {
            let value = match encoded.map_get(&entry.key) {
                Some(value) => from_prepared_value(entry, value)?,
                None if entry.omit_empty => entry.value_schema.default_value(),
                None => return Err(SchemaError::MissingKey(entry.key.clone())),
            };
            pairs.push((EncodingData::Str(entry.key.clone()), value));
        }
        Ok(EncodingData::Map(pairs))
    }
}

/// Key kind of the variable-key map schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MapKeyKind {
    Uint64,
    String,
    ByteArray,
    BinaryString,
}

impl MapKeyKind {
    fn schema_name(self) -> &'static str {
        match self {
            MapKeyKind::Uint64 => "uint64 map",
            MapKeyKind::String => "string map",
            MapKeyKind::ByteArray => "byte array map",
            MapKeyKind::BinaryString => "binary string map",
        }
    }
}

fn push_unique(
    pairs: &mut Vec<(EncodingData, EncodingData)>,
    key: EncodingData,
    value: EncodingData,
) -> Result<(), SchemaError> {
    if pairs.iter().any(|(existing, _)| *existing == key) {
        return Err(SchemaError::DuplicateKey(format!("{key:?}")));
    }
    pairs.push((key, value));
    Ok(())
}

pub(crate) fn prepare_msgpack_keyed(
    kind: MapKeyKind,
    value_schema: &Schema,
    data: &EncodingData,
) -> Result<EncodingData, SchemaError> {
    let EncodingData::Map(entries) = data else {
        return Err(mismatch(kind.schema_name(), data));
    };
    let mut pairs = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let wire_key = match kind {
            MapKeyKind::Uint64 => EncodingData::Uint(ensure_uint64(key)?),
            MapKeyKind::String => match key {
                EncodingData::Str(s) => EncodingData::Str(s.clone()),
                other => return Err(SchemaError::InvalidMapKey(format!("{other:?}"))),
            },
            MapKeyKind::ByteArray => match key {
                EncodingData::Bytes(b) => EncodingData::Bytes(b.clone()),
                other => return Err(SchemaError::InvalidMapKey(format!("{other:?}"))),
            },
            MapKeyKind::BinaryString => match key {
                EncodingData::Bytes(b) => EncodingData::BinaryStr(b.clone()),
                other => return Err(SchemaError::InvalidMapKey(format!("{other:?}"))),
            },
        };
        push_unique(&mut pairs, wire_key, value_schema.prepare_msgpack(value)?)?;
    }
    Ok(EncodingData::Map(pairs))
}

pub(crate) fn from_prepared_msgpack_keyed(
    kind: MapKeyKind,
    value_schema: &Schema,
    encoded: &EncodingData,
    provider: &RawStringProvider<'_>,
) -> Result<EncodingData, SchemaError> {
    if kind == MapKeyKind::BinaryString {
        // The decoded tree is lossy for the keys; read them from the wire.
        let mut pairs = Vec::new();
        for (key_bytes, raw_value) in provider.raw_map_at_current_location()? {
            let value = value_schema.from_prepared_msgpack(
                &convert_raw_strings(&raw_value),
                &provider.with_map_value(EncodingData::BinaryStr(key_bytes.clone())),
            )?;
            push_unique(&mut pairs, EncodingData::Bytes(key_bytes), value)?;
        }
        return Ok(EncodingData::Map(pairs));
    }
    let EncodingData::Map(entries) = encoded else {
        return Err(mismatch(kind.schema_name(), encoded));
    };
    let mut pairs = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let logical_key = match kind {
            MapKeyKind::Uint64 => EncodingData::Uint(ensure_uint64(key)?),
            MapKeyKind::String => match key {
                EncodingData::Str(s) => EncodingData::Str(s.clone()),
                other => return Err(SchemaError::InvalidMapKey(format!("{other:?}"))),
            },
            MapKeyKind::ByteArray => match key {
                EncodingData::Bytes(b) => EncodingData::Bytes(b.clone()),
                other => return Err(SchemaError::InvalidMapKey(format!("{other:?}"))),
            },
            MapKeyKind::BinaryString => unreachable!(),
        };
        let value =
            value_schema.from_prepared_msgpack(value, &provider.with_map_value(key.clone()))?;
        push_unique(&mut pairs, logical_key, value)?;
    }
    Ok(EncodingData::Map(pairs))
}

pub(crate) fn prepare_json_keyed(
    kind: MapKeyKind,
    value_schema: &Schema,
    data: &EncodingData,
    options: &PrepareJsonOptions,
) -> Result<EncodingData, SchemaError> {
    let EncodingData::Map(entries) = data else {
        return Err(mismatch(kind.schema_name(), data));
    };
    let mut pairs = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let json_key = match kind {
            MapKeyKind::Uint64 => EncodingData::Str(ensure_uint64(key)?.to_string()),
            MapKeyKind::String => match key {
                EncodingData::Str(s) => EncodingData::Str(s.clone()),
                other => return Err(SchemaError::InvalidMapKey(format!("{other:?}"))),
            },
            MapKeyKind::ByteArray => match key {
                EncodingData::Bytes(b) => EncodingData::Str(BASE64_STANDARD.encode(b)),
                other => return Err(SchemaError::InvalidMapKey(format!("{other:?}"))),
            },
            MapKeyKind::BinaryString => match key {
                EncodingData::Bytes(b) => prepare_binary_string_json(b, options)?,
                other => return Err(SchemaError::InvalidMapKey(format!("{other:?}"))),
            },
        };
        push_unique(&mut pairs, json_key, value_schema.prepare_json(value, options)?)?;
    }
    Ok(EncodingData::Map(pairs))
}

pub(crate) fn from_prepared_json_keyed(
    kind: MapKeyKind,
    value_schema: &Schema,
    encoded: &EncodingData,
) -> Result<EncodingData, SchemaError> {
    let EncodingData::Map(entries) = encoded else {
        return Err(mismatch(kind.schema_name(), encoded));
    };
    let mut pairs = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let logical_key = match (kind, key) {
            (MapKeyKind::Uint64, EncodingData::Str(s)) => {
                let uint: u64 = s
                    .parse()
                    .map_err(|_| SchemaError::InvalidMapKey(s.clone()))?;
                EncodingData::Uint(uint)
            }
            (MapKeyKind::String, EncodingData::Str(s)) => EncodingData::Str(s.clone()),
            (MapKeyKind::ByteArray, EncodingData::Str(s)) => {
                EncodingData::Bytes(decode_base64(s)?)
            }
            (MapKeyKind::BinaryString, EncodingData::Str(s)) => {
                EncodingData::Bytes(s.as_bytes().to_vec())
            }
            (MapKeyKind::BinaryString, EncodingData::BinaryStr(b)) => {
                EncodingData::Bytes(b.clone())
            }
            (_, other) => return Err(SchemaError::InvalidMapKey(format!("{other:?}"))),
        };
        push_unique(&mut pairs, logical_key, value_schema.from_prepared_json(value)?)?;
    }
    Ok(EncodingData::Map(pairs))
}

/// Recursively replaces undecoded raw-string markers with lossy strings, the
/// shape the ordinary decode path would have produced.
fn convert_raw_strings(value: &EncodingData) -> EncodingData {
    match value {
        EncodingData::BinaryStr(b) => {
            EncodingData::Str(String::from_utf8_lossy(b).into_owned())
        }
        EncodingData::List(items) => {
            EncodingData::List(items.iter().map(convert_raw_strings).collect())
        }
        EncodingData::Map(pairs) => EncodingData::Map(
            pairs
                .iter()
                .map(|(k, v)| (convert_raw_strings(k), convert_raw_strings(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_schema() -> NamedMapSchema {
        NamedMapSchema::new(vec![
            NamedMapEntry::new("a", Schema::Uint64),
            NamedMapEntry::new("b", Schema::String),
            NamedMapEntry::new("c", Schema::ByteArray),
        ])
        .unwrap()
    }

    #[test]
    fn construction_validates_embedding() {
        let bad_key = NamedMapSchema::new(vec![NamedMapEntry {
            key: "x".into(),
            value_schema: Schema::NamedMap(test_schema()),
            omit_empty: false,
            embedded: true,
        }]);
        assert_eq!(bad_key, Err(SchemaError::EmbeddedKeyNotEmpty));

        let bad_schema = NamedMapSchema::new(vec![NamedMapEntry {
            key: String::new(),
            value_schema: Schema::Uint64,
            omit_empty: false,
            embedded: true,
        }]);
        assert_eq!(bad_schema, Err(SchemaError::EmbeddedValueNotNamedMap));
    }

    #[test]
    fn construction_rejects_duplicate_flattened_keys() {
        let inner = NamedMapSchema::new(vec![NamedMapEntry::new("a", Schema::Boolean)]).unwrap();
        let result = NamedMapSchema::new(vec![
            NamedMapEntry::new("a", Schema::Uint64),
            NamedMapEntry::embedded(Schema::NamedMap(inner)),
        ]);
        assert_eq!(result, Err(SchemaError::DuplicateKey("a".into())));
    }

    #[test]
    fn embedded_entries_flatten_in_position() {
        let inner = NamedMapSchema::new(vec![
            NamedMapEntry::new("m", Schema::Boolean),
            NamedMapEntry::new("n", Schema::Uint64),
        ])
        .unwrap();
        let outer = NamedMapSchema::new(vec![
            NamedMapEntry::new("a", Schema::Uint64),
            NamedMapEntry::embedded(Schema::NamedMap(inner)),
            NamedMapEntry::new("z", Schema::String),
        ])
        .unwrap();
        let keys: Vec<&str> = outer.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["a", "m", "n", "z"]);
    }

    #[test]
    fn omit_empty_drops_default_values() {
        let schema = test_schema();
        let all_default = EncodingData::map_from_entries([
            ("a", EncodingData::Uint(0)),
            ("b", EncodingData::Str(String::new())),
            ("c", EncodingData::Bytes(vec![])),
        ]);
        assert_eq!(
            schema.prepare_msgpack(&all_default).unwrap(),
            EncodingData::Map(vec![])
        );

        let partial =
            EncodingData::map_from_entries([("a", EncodingData::Uint(7))]);
        assert_eq!(
            schema.prepare_msgpack(&partial).unwrap(),
            EncodingData::map_from_entries([("a", EncodingData::Uint(7))])
        );
    }

    #[test]
    fn decode_restores_omitted_defaults() {
        let schema = test_schema();
        let decoded = schema.from_prepared_json(&EncodingData::Map(vec![])).unwrap();
        assert_eq!(
            decoded,
            EncodingData::map_from_entries([
                ("a", EncodingData::Uint(0)),
                ("b", EncodingData::Str(String::new())),
                ("c", EncodingData::Bytes(vec![])),
            ])
        );
    }

    #[test]
    fn required_entry_missing_is_an_error() {
        let schema = NamedMapSchema::new(vec![
            NamedMapEntry::new("a", Schema::Uint64).required(),
        ])
        .unwrap();
        assert_eq!(
            schema.from_prepared_json(&EncodingData::Map(vec![])),
            Err(SchemaError::MissingKey("a".into()))
        );
    }

    #[test]
    fn unknown_input_keys_are_ignored() {
        let schema = test_schema();
        let input = EncodingData::map_from_entries([
            ("a", EncodingData::Uint(1)),
            ("zzz", EncodingData::Str("extra".into())),
        ]);
        assert_eq!(
            schema.prepare_msgpack(&input).unwrap(),
            EncodingData::map_from_entries([("a", EncodingData::Uint(1))])
        );
    }

    #[test]
    fn uint64_map_coerces_and_rejects_duplicates() {
        let schema = Schema::Uint64Map(Box::new(Schema::String));
        let data = EncodingData::Map(vec![
            (EncodingData::Uint(1), EncodingData::Str("x".into())),
            (EncodingData::Float(1.0), EncodingData::Str("y".into())),
        ]);
        // Both keys coerce to uint 1.
        assert!(matches!(
            schema.prepare_msgpack(&data),
            Err(SchemaError::DuplicateKey(_))
        ));
    }

    #[test]
    fn byte_array_map_json_keys_are_base64() {
        let schema = Schema::ByteArrayMap(Box::new(Schema::Uint64));
        let data = EncodingData::Map(vec![(
            EncodingData::Bytes(vec![255, 255, 0]),
            EncodingData::Uint(9),
        )]);
        let prepared = schema
            .prepare_json(&data, &PrepareJsonOptions::default())
            .unwrap();
        assert_eq!(
            prepared,
            EncodingData::Map(vec![(
                EncodingData::Str("//8A".into()),
                EncodingData::Uint(9)
            )])
        );
        assert_eq!(schema.from_prepared_json(&prepared).unwrap(), data);
    }
}
