//! [`IntDecoding`] — policy for decoding integers that may exceed the range a
//! 64-bit float can represent exactly.
//!
//! JSON integer literals and msgpack uint fields can hold the full unsigned
//! 64-bit range, but many downstream consumers work with float-backed
//! numbers that are only exact up to 2^53 - 1. This policy controls what
//! happens above that limit.

/// Maximum integer a 64-bit float can represent without losing precision.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Configures how integers are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntDecoding {
    /// All integers decode as floats. Values above [`MAX_SAFE_INTEGER`]
    /// silently lose precision. Exists for legacy compatibility only.
    Unsafe,
    /// All integers decode as floats, but values above [`MAX_SAFE_INTEGER`]
    /// are an error instead of losing precision.
    #[default]
    Safe,
    /// Integers decode as floats when they fit in [`MAX_SAFE_INTEGER`],
    /// otherwise as exact unsigned 64-bit integers.
    Mixed,
    /// All integers decode as exact unsigned 64-bit integers.
    Bigint,
}
