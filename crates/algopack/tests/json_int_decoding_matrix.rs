//! Integer decoding mode matrix over the 2^53 - 1 safe-integer boundary.

use algopack::{json, EncodingData, IntDecoding, MAX_SAFE_INTEGER};

const INPUT: &str = concat!(
    "{\"a\":0,",
    "\"b\":9007199254740991,",  // 2^53 - 1
    "\"c\":9007199254740992,",  // 2^53
    "\"d\":9223372036854775807}" // i64::MAX
);

fn field(decoded: &EncodingData, key: &str) -> EncodingData {
    decoded.map_get(key).expect("field present").clone()
}

#[test]
fn unsafe_mode_always_floats() {
    let decoded = json::decode(INPUT, IntDecoding::Unsafe).unwrap();
    assert_eq!(field(&decoded, "a"), EncodingData::Float(0.0));
    assert_eq!(
        field(&decoded, "b"),
        EncodingData::Float(9007199254740991.0)
    );
    // Above the boundary, precision is silently lost.
    assert_eq!(
        field(&decoded, "c"),
        EncodingData::Float(9007199254740992.0)
    );
    assert_eq!(
        field(&decoded, "d"),
        EncodingData::Float(9223372036854775807u64 as f64)
    );
}

#[test]
fn safe_mode_refuses_above_boundary() {
    assert!(json::decode(INPUT, IntDecoding::Safe).is_err());

    let small = "{\"a\":0,\"b\":9007199254740991}";
    let decoded = json::decode(small, IntDecoding::Safe).unwrap();
    assert_eq!(
        field(&decoded, "b"),
        EncodingData::Float(MAX_SAFE_INTEGER as f64)
    );
}

#[test]
fn mixed_mode_switches_at_boundary() {
    let decoded = json::decode(INPUT, IntDecoding::Mixed).unwrap();
    assert_eq!(field(&decoded, "a"), EncodingData::Float(0.0));
    assert_eq!(
        field(&decoded, "b"),
        EncodingData::Float(9007199254740991.0)
    );
    assert_eq!(field(&decoded, "c"), EncodingData::Uint(9007199254740992));
    assert_eq!(
        field(&decoded, "d"),
        EncodingData::Uint(9223372036854775807)
    );
}

#[test]
fn bigint_mode_always_exact() {
    let decoded = json::decode(INPUT, IntDecoding::Bigint).unwrap();
    assert_eq!(field(&decoded, "a"), EncodingData::Uint(0));
    assert_eq!(field(&decoded, "b"), EncodingData::Uint(9007199254740991));
    assert_eq!(field(&decoded, "c"), EncodingData::Uint(9007199254740992));
    assert_eq!(
        field(&decoded, "d"),
        EncodingData::Uint(9223372036854775807)
    );
}

#[test]
fn beyond_u64_only_unsafe_mode_accepts() {
    const TOO_BIG: &str = "18446744073709551616"; // 2^64
    assert_eq!(
        json::decode(TOO_BIG, IntDecoding::Unsafe).unwrap(),
        EncodingData::Float(18446744073709551616.0)
    );
    for mode in [IntDecoding::Safe, IntDecoding::Mixed, IntDecoding::Bigint] {
        assert!(json::decode(TOO_BIG, mode).is_err(), "accepted in {mode:?}");
    }
}

#[test]
fn negative_literals_across_the_boundary() {
    const SAFE_NEG: &str = "-9007199254740991"; // -(2^53 - 1)
    const BIG_NEG: &str = "-9007199254740992"; // -2^53

    assert_eq!(
        json::decode(SAFE_NEG, IntDecoding::Safe).unwrap(),
        EncodingData::Float(-9007199254740991.0)
    );
    assert!(json::decode(BIG_NEG, IntDecoding::Safe).is_err());

    assert_eq!(
        json::decode(SAFE_NEG, IntDecoding::Mixed).unwrap(),
        EncodingData::Float(-9007199254740991.0)
    );
    assert_eq!(
        json::decode(BIG_NEG, IntDecoding::Mixed).unwrap(),
        EncodingData::Int(-9007199254740992)
    );

    assert_eq!(
        json::decode(BIG_NEG, IntDecoding::Unsafe).unwrap(),
        EncodingData::Float(-9007199254740992.0)
    );
    assert_eq!(
        json::decode(BIG_NEG, IntDecoding::Bigint).unwrap(),
        EncodingData::Int(-9007199254740992)
    );
}

#[test]
fn floats_never_promote() {
    // A decimal point or exponent always means an imprecise float, even in
    // bigint mode.
    let decoded = json::decode("{\"x\":1.0,\"y\":1e2}", IntDecoding::Bigint).unwrap();
    assert_eq!(field(&decoded, "x"), EncodingData::Float(1.0));
    assert_eq!(field(&decoded, "y"), EncodingData::Float(100.0));
}

#[test]
fn encoder_emits_bare_literals_beyond_the_boundary() {
    let tree = EncodingData::map_from_entries([("v", EncodingData::Uint(u64::MAX))]);
    assert_eq!(
        json::encode(&tree).unwrap(),
        "{\"v\":18446744073709551615}"
    );
    // Literal-for-literal round trip.
    assert_eq!(
        json::decode(&json::encode(&tree).unwrap(), IntDecoding::Bigint).unwrap(),
        tree
    );
}
