//! Domain-separated leaf hashing
//!
//! `content_hash = SHA256(DOMAIN_PREFIX || canonical_bytes)`

mod confidential;

pub use confidential::{ConfidentialTag, InsecureDemoTag};

use crate::canonical;
use crate::model::{Hash, Record};
use crate::Result;
use serde_json::Value;

/// Fixed per-protocol-version prefix mixed into every leaf hash
pub const DOMAIN_PREFIX: &[u8] = b"MSGv1|";

/// Hash canonical bytes under the protocol's domain prefix
pub fn hash_canonical(canonical_bytes: &[u8]) -> Hash {
    Hash::digest_many(&[DOMAIN_PREFIX, canonical_bytes])
}

/// Canonicalize and hash an arbitrary JSON value
pub fn hash_value(value: &Value) -> Result<(Hash, Vec<u8>)> {
    let bytes = canonical::canonicalize(value)?;
    Ok((hash_canonical(&bytes), bytes))
}

/// Hash a sealed record (nonce included)
///
/// Returns the content hash together with the canonical bytes it was
/// computed over.
pub fn hash_leaf(record: &Record) -> Result<(Hash, Vec<u8>)> {
    hash_value(&record.payload())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordInput;
    use serde_json::json;

    fn sealed(content: Value) -> Record {
        RecordInput::new("alice", 1_700_000_000, content)
            .with_provider("openai", "gpt-4o-mini")
            .seal_with_nonce("a1b2c3d4e5")
            .unwrap()
    }

    #[test]
    fn test_hash_is_stable() {
        let record = sealed(json!("hello"));
        let (h1, b1) = hash_leaf(&record).unwrap();
        let (h2, b2) = hash_leaf(&record).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(b1, b2);
        assert_eq!(hash_canonical(&b1), h1);
    }

    #[test]
    fn test_domain_prefix_applied() {
        let (h, bytes) = hash_leaf(&sealed(json!("hello"))).unwrap();
        assert_ne!(h, Hash::digest(&bytes));
        let mut prefixed = DOMAIN_PREFIX.to_vec();
        prefixed.extend_from_slice(&bytes);
        assert_eq!(h, Hash::digest(&prefixed));
    }

    #[test]
    fn test_canonical_bytes_match_reference_layout() {
        let (_, bytes) = hash_leaf(&sealed(json!("hello"))).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"content":"hello","created":1700000000,"model":"gpt-4o-mini","nonce":"a1b2c3d4e5","provider":"openai","system_fingerprint":"none","user_id":"alice"}"#
        );
    }

    #[test]
    fn test_null_content_still_hashes() {
        let (h, bytes) = hash_leaf(&sealed(Value::Null)).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains(r#""content":null"#));
        assert!(!h.is_zero());
    }

    #[test]
    fn test_nonce_changes_hash() {
        let a = sealed(json!("same"));
        let mut b = a.clone();
        b.nonce = "ffffffffff".into();
        assert_ne!(hash_leaf(&a).unwrap().0, hash_leaf(&b).unwrap().0);
    }
}
