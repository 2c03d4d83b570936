use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MsgpackError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid msgpack byte 0x{byte:02x} at offset {offset}")]
    InvalidByte { byte: u8, offset: usize },
    #[error("trailing bytes after msgpack value")]
    TrailingData,
    #[error("expected a map header")]
    NotMap,
    #[error("expected an array header")]
    NotArr,
    #[error("expected a string header")]
    NotStr,
    #[error("map key not found: {0}")]
    KeyNotFound(String),
    #[error("array index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: usize, length: usize },
    #[error("invalid map key kind: {0}")]
    InvalidKey(&'static str),
    #[error("duplicate map key")]
    DuplicateKey,
    #[error("{path}: expected a string-typed value, found {found}")]
    ExpectedRawString { path: String, found: &'static str },
    #[error("{path}: expected a map, found {found}")]
    ExpectedMap { path: String, found: &'static str },
}
