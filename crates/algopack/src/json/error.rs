use thiserror::Error;

use crate::uint64::Uint64Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum JsonError {
    #[error("invalid JSON at byte offset {0}")]
    Invalid(usize),
    #[error("invalid UTF-8 in JSON text")]
    InvalidUtf8,
    #[error("invalid escape sequence at byte offset {0}")]
    InvalidEscape(usize),
    #[error("unterminated string starting at byte offset {0}")]
    UnterminatedString(usize),
    #[error("trailing characters after JSON value")]
    TrailingData,
    #[error("integer literal out of range: {0}")]
    IntegerOutOfRange(String),
    #[error("cannot serialize {0} as a JSON object key")]
    InvalidKey(&'static str),
    #[error(transparent)]
    Uint64(#[from] Uint64Error),
}
