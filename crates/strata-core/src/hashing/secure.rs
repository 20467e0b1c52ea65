//! Secure 256-bit content hashing backed by BLAKE3.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::strip_blank_lines;

/// Errors produced when reconstructing a [`SecureHash`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecureHashError {
    /// The input was not valid hexadecimal.
    #[error("invalid hex digest: {0}")]
    InvalidHex(String),

    /// The decoded digest had the wrong length.
    #[error("invalid digest length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 32-byte BLAKE3 digest.
///
/// Cheap to copy and compare, usable as a `HashMap` key, and convertible to
/// and from a hex string for display and storage.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecureHash([u8; 32]);

impl SecureHash {
    /// Size of the digest in bytes.
    pub const SIZE: usize = 32;

    /// Wraps raw digest bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the digest as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Renders the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a digest from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, SecureHashError> {
        let bytes =
            hex::decode(hex_str).map_err(|e| SecureHashError::InvalidHex(e.to_string()))?;
        if bytes.len() != Self::SIZE {
            return Err(SecureHashError::InvalidLength(bytes.len()));
        }
        let mut array = [0u8; 32];
        array.copy_from_slice(&bytes);
        Ok(Self(array))
    }
}

impl fmt::Debug for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureHash({})", self.to_hex())
    }
}

impl fmt::Display for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for SecureHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for SecureHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Computes the BLAKE3 hash of the input string.
///
/// ## Examples
///
/// ```
/// use strata_core::hashing::hash_secure;
///
/// let digest = hash_secure("content");
/// assert_eq!(digest, hash_secure("content"));
/// assert_eq!(digest.to_hex().len(), 64);
/// ```
#[inline]
pub fn hash_secure(data: &str) -> SecureHash {
    hash_secure_bytes(data.as_bytes())
}

/// Computes the BLAKE3 hash of raw bytes.
#[inline]
pub fn hash_secure_bytes(data: &[u8]) -> SecureHash {
    SecureHash(*blake3::hash(data).as_bytes())
}

/// Computes the BLAKE3 hash after trimming leading/trailing whitespace.
#[inline]
pub fn hash_secure_trimmed(data: &str) -> SecureHash {
    hash_secure_bytes(data.trim().as_bytes())
}

/// Computes the BLAKE3 hash with blank lines removed.
pub fn hash_secure_normalized(data: &str) -> SecureHash {
    hash_secure_bytes(strip_blank_lines(data).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Known BLAKE3 digests.
    const EMPTY_DIGEST: &str = "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262";

    #[test]
    fn empty_input_matches_test_vector() {
        assert_eq!(hash_secure("").to_hex(), EMPTY_DIGEST);
    }

    #[test]
    fn deterministic() {
        assert_eq!(hash_secure("data"), hash_secure("data"));
    }

    #[test]
    fn different_content_different_digest() {
        assert_ne!(hash_secure("a"), hash_secure("b"));
    }

    #[test]
    fn trimmed_matches_pre_trimmed_input() {
        assert_eq!(hash_secure_trimmed("  data  "), hash_secure("data"));
    }

    #[test]
    fn normalized_ignores_blank_lines() {
        assert_eq!(
            hash_secure_normalized("a\n\nb"),
            hash_secure_normalized("a\nb")
        );
    }

    #[test]
    fn hex_round_trip() {
        let digest = hash_secure("round trip");
        let restored = SecureHash::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(digest, restored);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(matches!(
            SecureHash::from_hex("zz"),
            Err(SecureHashError::InvalidHex(_))
        ));
        assert!(matches!(
            SecureHash::from_hex("abcd"),
            Err(SecureHashError::InvalidLength(2))
        ));
    }

    #[test]
    fn usable_as_map_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(hash_secure("key"), "value");
        assert_eq!(map.get(&hash_secure("key")), Some(&"value"));
    }

    #[test]
    fn serde_round_trip() {
        let digest = hash_secure("serialize me");
        let json = serde_json::to_string(&digest).unwrap();
        let restored: SecureHash = serde_json::from_str(&json).unwrap();
        assert_eq!(digest, restored);
    }
}
