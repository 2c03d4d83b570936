//! Checksummed account addresses.
//!
//! An address is a 32-byte public key. Its text form is the unpadded base32
//! encoding of `pubkey || checksum`, where the checksum is the last 4 bytes
//! of the SHA-512/256 digest of the public key (58 characters total).

use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha512_256};
use thiserror::Error;

pub const ADDRESS_BYTE_LENGTH: usize = 32;
pub const CHECKSUM_BYTE_LENGTH: usize = 4;
/// Length of the base32 text form: 36 bytes -> 58 characters, no padding.
pub const ADDRESS_STRING_LENGTH: usize = 58;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address seems to be malformed")]
    Malformed,
    #[error("wrong checksum for address")]
    WrongChecksum,
    #[error("invalid public key length: expected 32 bytes, got {0}")]
    WrongKeyLength(usize),
}

/// A 32-byte public key with checksummed text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address {
    pub public_key: [u8; ADDRESS_BYTE_LENGTH],
}

impl Address {
    pub fn new(public_key: [u8; ADDRESS_BYTE_LENGTH]) -> Self {
        Self { public_key }
    }

    /// The all-zero address.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Builds an address from a raw public key slice, checking the length.
    pub fn from_public_key(bytes: &[u8]) -> Result<Self, AddressError> {
        let public_key: [u8; ADDRESS_BYTE_LENGTH] = bytes
            .try_into()
            .map_err(|_| AddressError::WrongKeyLength(bytes.len()))?;
        Ok(Self { public_key })
    }

    /// Parses the checksummed base32 text form, verifying the checksum.
    pub fn from_string(s: &str) -> Result<Self, AddressError> {
        if s.len() != ADDRESS_STRING_LENGTH {
            return Err(AddressError::Malformed);
        }
        let decoded = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|_| AddressError::Malformed)?;
        if decoded.len() != ADDRESS_BYTE_LENGTH + CHECKSUM_BYTE_LENGTH {
            return Err(AddressError::Malformed);
        }
        let (pk, cs) = decoded.split_at(ADDRESS_BYTE_LENGTH);
        let address = Self::from_public_key(pk)?;
        if address.checksum() != cs {
            return Err(AddressError::WrongChecksum);
        }
        Ok(address)
    }

    /// Returns true if `s` is a well-formed checksummed address string.
    pub fn is_valid_string(s: &str) -> bool {
        Self::from_string(s).is_ok()
    }

    /// Last 4 bytes of the SHA-512/256 digest of the public key.
    pub fn checksum(&self) -> [u8; CHECKSUM_BYTE_LENGTH] {
        let digest = Sha512_256::digest(self.public_key);
        let mut checksum = [0u8; CHECKSUM_BYTE_LENGTH];
        checksum.copy_from_slice(&digest[digest.len() - CHECKSUM_BYTE_LENGTH..]);
        checksum
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = [0u8; ADDRESS_BYTE_LENGTH + CHECKSUM_BYTE_LENGTH];
        buf[..ADDRESS_BYTE_LENGTH].copy_from_slice(&self.public_key);
        buf[ADDRESS_BYTE_LENGTH..].copy_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&buf))
    }
}
