//! Content checksums
//!
//! Provides [`ContentHash`], a 32-byte Blake3 digest used to fingerprint
//! fragment files and path subtrees.

use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::canonical::canonicalize;

/// A 32-byte content hash (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Wrap raw digest bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash arbitrary bytes
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Structural fingerprint of a JSON tree
    ///
    /// Two trees that differ only in object key order or sequence element
    /// order produce the same fingerprint.
    #[must_use]
    pub fn of_structure(value: &Value) -> Self {
        Self::compute(canonicalize(value).to_string().as_bytes())
    }

    /// First 16 hex characters
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| HashError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl serde::Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors parsing a hex-encoded hash
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Decoded digest has the wrong size
    #[error("invalid hash length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Not valid hex
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
