//! Content checksum primitives
//!
//! Provides [`Checksum`], a strongly-typed 32-byte SHA-256 digest used to
//! address published artifacts and as Merkle leaf input.

use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Digest length in bytes
pub const CHECKSUM_LEN: usize = 32;

/// Length of the lowercase hex rendering
pub const CHECKSUM_HEX_LEN: usize = CHECKSUM_LEN * 2;

/// A 32-byte content checksum (SHA-256)
///
/// Renders as 64 lowercase hex characters. Ordering of the raw bytes matches
/// lexicographic ordering of the hex rendering, which the Merkle index relies
/// on for its canonical leaf order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checksum([u8; CHECKSUM_LEN]);

impl Checksum {
    /// Create a checksum from raw digest bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; CHECKSUM_LEN]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CHECKSUM_LEN] {
        &self.0
    }

    /// Convert to byte array (consumes self)
    #[inline]
    #[must_use]
    pub const fn into_bytes(self) -> [u8; CHECKSUM_LEN] {
        self.0
    }

    /// Create checksum from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ChecksumError> {
        let arr: [u8; CHECKSUM_LEN] =
            bytes
                .try_into()
                .map_err(|_| ChecksumError::InvalidLength {
                    expected: CHECKSUM_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    /// SHA-256 of arbitrary data
    #[inline]
    #[must_use]
    pub fn digest(data: &[u8]) -> Self {
        let out: [u8; CHECKSUM_LEN] = Sha256::digest(data).into();
        Self(out)
    }

    /// Full lowercase hex rendering
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Checksum {
    type Err = ChecksumError;

    /// Parses exactly 64 lowercase hex characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != CHECKSUM_HEX_LEN {
            return Err(ChecksumError::InvalidLength {
                expected: CHECKSUM_HEX_LEN,
                actual: s.len(),
            });
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(ChecksumError::NotLowercaseHex(s.to_string()));
        }
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8; CHECKSUM_LEN]> for Checksum {
    fn as_ref(&self) -> &[u8; CHECKSUM_LEN] {
        &self.0
    }
}

impl serde::Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> serde::Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ChecksumVisitor;

        impl serde::de::Visitor<'_> for ChecksumVisitor {
            type Value = Checksum;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a 64-character lowercase hex string or 32 raw bytes")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Checksum::from_slice(value).map_err(serde::de::Error::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(ChecksumVisitor)
        } else {
            deserializer.deserialize_bytes(ChecksumVisitor)
        }
    }
}

/// Errors that can occur when computing or parsing checksums
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// Invalid digest or hex length
    #[error("invalid checksum length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Text contains characters outside `[0-9a-f]`
    #[error("checksum is not lowercase hex: '{0}'")]
    NotLowercaseHex(String),

    /// Hex decoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Content could not be turned into canonical JSON
    #[error("malformed artifact: {0}")]
    Malformed(#[from] serde_json::Error),
}
