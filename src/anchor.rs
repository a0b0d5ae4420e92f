//! Hand-off to an anchoring ledger
//!
//! The engine never talks to a ledger itself. It produces the exact payloads
//! a ledger adapter needs: 32-byte digests, tree ids hashed with Keccak-256,
//! and a lowercase `0x` hex rendering for the wire.

use crate::merkle::{merkle_root, TreeState};
use crate::model::Hash;
use crate::store::ArchivedLeaf;
use crate::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};
use std::collections::HashMap;

/// `keccak256(utf8(tree_id))`, the key ledgers index trees by
pub fn tree_id_hash(tree_id: &str) -> Hash {
    Hash::from_bytes(Keccak256::digest(tree_id.as_bytes()).into())
}

/// A finalized root ready to publish
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPayload {
    pub tree_id: String,
    pub tree_id_hash: Hash,
    pub root: Hash,
}

impl AnchorPayload {
    pub fn new(tree_id: impl Into<String>, root: Hash) -> Self {
        let tree_id = tree_id.into();
        AnchorPayload {
            tree_id_hash: tree_id_hash(&tree_id),
            tree_id,
            root,
        }
    }

    /// Payload for a stored tree; a missing root is recomputed from leaves
    pub fn for_tree(state: &TreeState) -> Result<Self> {
        let root = state
            .root
            .or_else(|| merkle_root(&state.leaves))
            .ok_or_else(|| Error::Anchor(format!("tree {} has no leaves", state.tree_id)))?;
        Ok(AnchorPayload::new(state.tree_id.clone(), root))
    }

    /// Wire form: digests as lowercase `0x` hex
    pub fn to_wire(&self) -> Value {
        json!({
            "tree_id": self.tree_id,
            "tree_id_hash": self.tree_id_hash.to_prefixed_hex(),
            "root": self.root.to_prefixed_hex(),
        })
    }
}

/// How a leaf's content is committed alongside it on a ledger
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorCommitMode {
    /// `keccak256(content bytes)`
    #[default]
    Hash,
    /// Always the zero digest
    Zero,
}

impl std::str::FromStr for VectorCommitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(VectorCommitMode::Hash),
            "zero" => Ok(VectorCommitMode::Zero),
            other => Err(Error::Config(format!("unknown vector commit mode: {}", other))),
        }
    }
}

/// Per-leaf metadata a ledger registers next to the leaf hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafRegistration {
    pub leaf: Hash,
    pub tree_id: String,
    pub tree_id_hash: Hash,
    pub leaf_index: u32,
    pub identity: String,
    pub created: u64,
    pub provider: String,
    pub model: String,
    pub vector_commit: Hash,
    /// Bytes the vector commit was computed over, empty for `null` content
    pub content: Vec<u8>,
}

impl LeafRegistration {
    pub fn from_archived(leaf: &ArchivedLeaf, mode: VectorCommitMode) -> Result<Self> {
        let bytes = content_bytes(&leaf.content)?;
        let vector_commit = match (mode, &bytes) {
            (VectorCommitMode::Hash, Some(bytes)) => {
                Hash::from_bytes(Keccak256::digest(bytes).into())
            }
            _ => Hash::ZERO,
        };
        Ok(LeafRegistration {
            leaf: leaf.content_hash,
            tree_id: leaf.tree_id.clone(),
            tree_id_hash: tree_id_hash(&leaf.tree_id),
            leaf_index: leaf.leaf_index,
            identity: leaf.user_id.clone(),
            created: leaf.created,
            provider: leaf.provider.clone(),
            model: leaf.model.clone(),
            vector_commit,
            content: bytes.unwrap_or_default(),
        })
    }

    pub fn to_wire(&self) -> Value {
        json!({
            "leaf": self.leaf.to_prefixed_hex(),
            "tree_id": self.tree_id,
            "tree_id_hash": self.tree_id_hash.to_prefixed_hex(),
            "leaf_index": self.leaf_index,
            "meta": {
                "user_id": self.identity,
                "created": self.created,
                "provider": self.provider,
                "model": self.model,
            },
            "vector_commit": self.vector_commit.to_prefixed_hex(),
            "content": format!("0x{}", hex::encode(&self.content)),
        })
    }
}

/// Ledger encoding of leaf content
///
/// Strings commit their trimmed UTF-8 bytes, arrays of numbers their
/// little-endian `f32` values, `null` commits nothing. Anything else has no
/// ledger encoding.
fn content_bytes(content: &Value) -> Result<Option<Vec<u8>>> {
    match content {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.trim().as_bytes().to_vec())),
        Value::Array(items) if items.iter().all(Value::is_number) => {
            let mut bytes = Vec::with_capacity(items.len() * 4);
            for item in items {
                let f = item
                    .as_f64()
                    .ok_or_else(|| Error::Anchor(format!("unrepresentable number: {}", item)))?;
                bytes.extend_from_slice(&(f as f32).to_le_bytes());
            }
            Ok(Some(bytes))
        }
        _ => Err(Error::Anchor(
            "content must be a string or an array of numbers".into(),
        )),
    }
}

/// Outcome reported by a ledger adapter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnchorStatus {
    Registered,
    AlreadyRegistered,
    /// The ledger already holds a different root for this tree id
    RootMismatch { anchored: Hash },
}

/// Something that durably publishes roots
pub trait Anchor: Send + Sync {
    fn publish(&self, payload: &AnchorPayload) -> Result<AnchorStatus>;

    /// Root currently anchored for a tree id hash, if any
    fn anchored_root(&self, tree_id_hash: &Hash) -> Result<Option<Hash>>;
}

/// In-process ledger with register-once semantics
#[derive(Default)]
pub struct MemoryLedger {
    roots: Mutex<HashMap<Hash, Hash>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Anchor for MemoryLedger {
    fn publish(&self, payload: &AnchorPayload) -> Result<AnchorStatus> {
        let mut roots = self.roots.lock();
        match roots.get(&payload.tree_id_hash) {
            Some(existing) if *existing == payload.root => Ok(AnchorStatus::AlreadyRegistered),
            Some(existing) => {
                tracing::warn!(
                    tree_id = %payload.tree_id,
                    anchored = %existing.short(),
                    local = %payload.root.short(),
                    "tree already anchored with a different root"
                );
                Ok(AnchorStatus::RootMismatch {
                    anchored: *existing,
                })
            }
            None => {
                roots.insert(payload.tree_id_hash, payload.root);
                Ok(AnchorStatus::Registered)
            }
        }
    }

    fn anchored_root(&self, tree_id_hash: &Hash) -> Result<Option<Hash>> {
        Ok(self.roots.lock().get(tree_id_hash).copied())
    }
}
