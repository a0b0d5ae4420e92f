//! Archived leaves and the per-identity file layout

use crate::hasher;
use crate::merkle::{ProofEntry, TreeState};
use crate::model::{Hash, Record};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A committed leaf with everything needed to re-derive its hash
///
/// `proof` is the path issued at append time; it checks against the root
/// the tree had then. Ask the engine for a fresh proof against the current
/// root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchivedLeaf {
    pub user_id: String,
    pub created: u64,
    pub provider: String,
    pub model: String,
    #[serde(with = "json_text")]
    pub content: Value,
    pub system_fingerprint: String,
    pub nonce: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub content_hash: Hash,
    /// Rendered insecure demo tag, when enabled
    #[serde(default)]
    pub content_hash_fhe: Option<String>,
    pub canonical_json: String,
    pub tree_id: String,
    pub leaf_index: u32,
    pub proof: Vec<ProofEntry>,
}

impl ArchivedLeaf {
    /// The record this leaf was hashed from
    pub fn record(&self) -> Record {
        Record {
            identity: self.user_id.clone(),
            created: self.created,
            provider: self.provider.clone(),
            model: self.model.clone(),
            content: self.content.clone(),
            system_fingerprint: self.system_fingerprint.clone(),
            content_type: self.content_type.clone(),
            nonce: self.nonce.clone(),
        }
    }

    /// Re-hash the stored record and compare with the stored hash and
    /// canonical text
    pub fn rehash_matches(&self) -> Result<bool> {
        let (hash, bytes) = hasher::hash_leaf(&self.record())?;
        Ok(hash == self.content_hash && bytes == self.canonical_json.as_bytes())
    }
}

/// Everything stored for one identity
///
/// Top-level fields the engine does not own (chat history, logs) are kept
/// in `extra` and written back unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityFile {
    /// tree id → tree
    #[serde(default)]
    pub trees: BTreeMap<String, TreeState>,
    /// Archive of committed leaves in commit order
    #[serde(default)]
    pub messages: Vec<ArchivedLeaf>,
    /// Application data stored alongside the trees
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdentityFile {
    /// Fill in tree ids missing from older files (they were only map keys)
    pub(crate) fn normalize(mut self) -> Self {
        for (id, state) in self.trees.iter_mut() {
            if state.tree_id.is_empty() {
                state.tree_id = id.clone();
            }
        }
        self
    }

    pub fn find_leaf(&self, content_hash: &Hash) -> Option<&ArchivedLeaf> {
        self.messages.iter().find(|m| m.content_hash == *content_hash)
    }
}

/// JSON values inline in human-readable formats, as JSON text in binary
/// ones (bincode cannot carry self-describing values)
mod json_text {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Map, Value};

    pub fn serialize<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            value.serialize(serializer)
        } else {
            let text = serde_json::to_string(value).map_err(S::Error::custom)?;
            serializer.serialize_str(&text)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        if deserializer.is_human_readable() {
            Value::deserialize(deserializer)
        } else {
            let text = String::deserialize(deserializer)?;
            serde_json::from_str(&text).map_err(D::Error::custom)
        }
    }
}
