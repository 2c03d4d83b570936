//! Canonical msgpack wire-byte matrix: schema-driven encoding must produce
//! byte-exact output, and decoding must accept non-canonical input.

use algopack::schema::{NamedMapEntry, NamedMapSchema, Schema};
use algopack::{decode_msgpack_data, encode_msgpack_data, msgpack, EncodingData};

fn sample_schema() -> Schema {
    Schema::NamedMap(
        NamedMapSchema::new(vec![
            NamedMapEntry::new("a", Schema::Uint64),
            NamedMapEntry::new("b", Schema::String),
            NamedMapEntry::new("c", Schema::ByteArray),
        ])
        .expect("valid schema"),
    )
}

fn sample_value() -> EncodingData {
    EncodingData::map_from_entries([
        ("a", EncodingData::Uint(123)),
        ("b", EncodingData::Str("test".into())),
        ("c", EncodingData::Bytes(vec![255, 255, 0])),
    ])
}

#[test]
fn struct_encodes_to_exact_bytes() {
    let bytes = encode_msgpack_data(&sample_value(), &sample_schema()).unwrap();
    assert_eq!(
        bytes,
        [
            0x83, // fixmap(3)
            0xa1, b'a', 0x7b, // "a": 123
            0xa1, b'b', 0xa4, b't', b'e', b's', b't', // "b": "test"
            0xa1, b'c', 0xc4, 0x03, 0xff, 0xff, 0x00, // "c": bin(3)
        ]
    );
}

#[test]
fn struct_round_trips() {
    let schema = sample_schema();
    let bytes = encode_msgpack_data(&sample_value(), &schema).unwrap();
    assert_eq!(decode_msgpack_data(&bytes, &schema).unwrap(), sample_value());
}

#[test]
fn all_default_struct_is_empty_map() {
    let schema = sample_schema();
    let value = EncodingData::map_from_entries([
        ("a", EncodingData::Uint(0)),
        ("b", EncodingData::Str(String::new())),
        ("c", EncodingData::Bytes(vec![])),
    ]);
    let bytes = encode_msgpack_data(&value, &schema).unwrap();
    assert_eq!(bytes, [0x80]);
    // Decoding restores every omitted field to its default.
    assert_eq!(decode_msgpack_data(&bytes, &schema).unwrap(), value);
}

#[test]
fn uint64_boundary_values() {
    let schema = Schema::Uint64;
    for (value, expected) in [
        (0u64, vec![0x00]),
        (127, vec![0x7f]),
        (128, vec![0xcc, 0x80]),
        (65535, vec![0xcd, 0xff, 0xff]),
        (65536, vec![0xce, 0x00, 0x01, 0x00, 0x00]),
        (
            u64::MAX,
            vec![0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
        ),
    ] {
        let bytes = encode_msgpack_data(&EncodingData::Uint(value), &schema).unwrap();
        assert_eq!(bytes, expected, "encoding {value}");
        assert_eq!(
            decode_msgpack_data(&bytes, &schema).unwrap(),
            EncodingData::Uint(value)
        );
    }
}

#[test]
fn declaration_order_does_not_reach_the_wire() {
    // Same entries declared in a different order: identical bytes.
    let reordered = Schema::NamedMap(
        NamedMapSchema::new(vec![
            NamedMapEntry::new("c", Schema::ByteArray),
            NamedMapEntry::new("a", Schema::Uint64),
            NamedMapEntry::new("b", Schema::String),
        ])
        .expect("valid schema"),
    );
    assert_eq!(
        encode_msgpack_data(&sample_value(), &sample_schema()).unwrap(),
        encode_msgpack_data(&sample_value(), &reordered).unwrap()
    );
}

#[test]
fn decode_accepts_non_canonical_widths() {
    // {"a": 5} with "a" as str8 and 5 as uint64: legal input, never output.
    let wide = [
        0x81, 0xd9, 0x01, b'a', 0xcf, 0, 0, 0, 0, 0, 0, 0, 5,
    ];
    let schema = Schema::NamedMap(
        NamedMapSchema::new(vec![NamedMapEntry::new("a", Schema::Uint64)])
            .expect("valid schema"),
    );
    assert_eq!(
        decode_msgpack_data(&wide, &schema).unwrap(),
        EncodingData::map_from_entries([("a", EncodingData::Uint(5))])
    );
    // Re-encoding produces the canonical form.
    let canonical =
        encode_msgpack_data(&decode_msgpack_data(&wide, &schema).unwrap(), &schema).unwrap();
    assert_eq!(canonical, [0x81, 0xa1, b'a', 0x05]);
}

#[test]
fn untyped_decode_rejects_trailing_bytes() {
    assert!(msgpack::decode(&[0x01, 0x02]).is_err());
    assert_eq!(msgpack::decode(&[0x01]).unwrap(), EncodingData::Uint(1));
}
