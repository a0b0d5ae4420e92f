//! 32-byte SHA-256 digest used for leaves, nodes and roots

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 digest
///
/// Serializes as lowercase hex in human-readable formats (JSON) and as raw
/// bytes in binary ones (bincode).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; 32]);

impl Hash {
    /// The zero digest (used by ledgers as "no value")
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Create a hash from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// SHA-256 of arbitrary data
    pub fn digest(data: &[u8]) -> Self {
        Hash(Sha256::digest(data).into())
    }

    /// SHA-256 over the concatenation of several parts
    pub fn digest_many(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Hash(hasher.finalize().into())
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Lowercase hex with a `0x` prefix, the form ledgers expect
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// Parse from exactly 64 hex digits (no prefix)
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Hash(arr))
    }

    /// Lenient parse: surrounding whitespace, optional `0x`/`0X`, any case
    pub fn parse(s: &str) -> crate::Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != 64 {
            return Err(crate::Error::InvalidHash(format!(
                "expected 64 hex digits, got {}: {}",
                digits.len(),
                s
            )));
        }
        Hash::from_hex(digits).map_err(|e| crate::Error::InvalidHash(format!("{}: {}", s, e)))
    }

    /// Get a short prefix for display (first 7 chars, like git)
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }

    /// Check if this is the zero hash
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Hash::ZERO
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::str::FromStr for Hash {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Hash::parse(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(HexVisitor)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Hash)
        }
    }
}

struct HexVisitor;

impl<'de> Visitor<'de> for HexVisitor {
    type Value = Hash;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 32-byte digest as 64 hex digits")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Hash, E> {
        Hash::parse(v).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_digest() {
        let h1 = Hash::digest(b"hello");
        let h2 = Hash::digest(b"hello");
        let h3 = Hash::digest(b"world");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_known_sha256_vector() {
        assert_eq!(
            Hash::digest(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_many_matches_concatenation() {
        let parts = Hash::digest_many(&[b"MSGv1|", b"{}"]);
        assert_eq!(parts, Hash::digest(b"MSGv1|{}"));
    }

    #[test]
    fn test_parse_normalizes_prefix_and_case() {
        let h = Hash::digest(b"test data");
        let upper = format!("0X{}", h.to_hex().to_uppercase());
        assert_eq!(Hash::parse(&upper).unwrap(), h);
        assert_eq!(Hash::parse(&format!("  {}\n", h.to_prefixed_hex())).unwrap(), h);
        assert!(h.to_prefixed_hex().starts_with("0x"));
        assert_eq!(h.to_prefixed_hex().len(), 66);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Hash::parse("0x1234").is_err());
        assert!(Hash::parse(&"g".repeat(64)).is_err());
    }

    #[test]
    fn test_json_is_hex_and_bincode_is_bytes() {
        let h = Hash::digest(b"serde");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        assert_eq!(serde_json::from_str::<Hash>(&json).unwrap(), h);

        let bin = bincode::serialize(&h).unwrap();
        assert_eq!(bin.len(), 32);
        assert_eq!(bincode::deserialize::<Hash>(&bin).unwrap(), h);
    }

    #[test]
    fn test_hash_short() {
        let h = Hash::digest(b"test");
        assert_eq!(h.short().len(), 7);
    }
}
