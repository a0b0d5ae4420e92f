//! Placeholder "confidential" tag
//!
//! NOT ENCRYPTION. The tag is the content hash XOR-ed with a public,
//! fixed keystream (`SHA256("tfhe-demo")`). Anyone can invert it. It exists
//! only so downstream code can exercise an encrypted-comparison slot end to
//! end, and it is produced only when `insecure_demo_tag` is switched on.

use crate::model::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;

const DEMO_SALT_SEED: &[u8] = b"tfhe-demo";

/// Text prefix of the rendered demo tag
pub const DEMO_TAG_PREFIX: &str = "FHE_CTXT_";

/// A tag attached to a leaf for confidential comparison
///
/// Only the insecure demo variant exists. A real scheme must be added as a
/// separate variant, never by upgrading this one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ConfidentialTag {
    InsecureDemo(InsecureDemoTag),
}

impl ConfidentialTag {
    /// True for tags that offer no confidentiality at all
    pub fn is_insecure(&self) -> bool {
        matches!(self, ConfidentialTag::InsecureDemo(_))
    }
}

impl fmt::Display for ConfidentialTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidentialTag::InsecureDemo(tag) => fmt::Display::fmt(tag, f),
        }
    }
}

/// XOR of a content hash with a public keystream
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsecureDemoTag(Hash);

impl InsecureDemoTag {
    pub fn derive(content_hash: &Hash) -> Self {
        InsecureDemoTag(xor_keystream(content_hash))
    }

    /// Undo the XOR (which is the whole point: it hides nothing)
    pub fn reveal(&self) -> Hash {
        xor_keystream(&self.0)
    }

    pub fn as_hash(&self) -> &Hash {
        &self.0
    }
}

fn xor_keystream(input: &Hash) -> Hash {
    let salt = Hash::digest(DEMO_SALT_SEED);
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = input.as_bytes()[i] ^ salt.as_bytes()[i];
    }
    Hash::from_bytes(out)
}

impl fmt::Display for InsecureDemoTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", DEMO_TAG_PREFIX, self.0.to_hex())
    }
}

impl fmt::Debug for InsecureDemoTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InsecureDemoTag({})", self.0.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_tag_is_reversible() {
        let h = Hash::digest(b"leaf");
        let tag = InsecureDemoTag::derive(&h);
        assert_ne!(*tag.as_hash(), h);
        assert_eq!(tag.reveal(), h);
    }

    #[test]
    fn test_demo_tag_rendering() {
        let tag = InsecureDemoTag::derive(&Hash::digest(b"leaf"));
        let text = tag.to_string();
        assert!(text.starts_with(DEMO_TAG_PREFIX));
        assert_eq!(text.len(), DEMO_TAG_PREFIX.len() + 64);
    }

    #[test]
    fn test_tag_marked_insecure() {
        let tag = ConfidentialTag::InsecureDemo(InsecureDemoTag::derive(&Hash::ZERO));
        assert!(tag.is_insecure());
        let json = serde_json::to_value(tag).unwrap();
        assert_eq!(json["kind"], "insecure_demo");
    }
}
