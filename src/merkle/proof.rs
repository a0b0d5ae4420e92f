//! Inclusion proofs and their verification
//!
//! A proof is self-contained: checking it needs the leaf hash, the sibling
//! list and the claimed root, nothing else.

use super::tree::{hash_pair, HashAlgo};
use crate::canonical::CanonRule;
use crate::hasher::DOMAIN_PREFIX;
use crate::model::Hash;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which side the sibling sits on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

/// One step of an inclusion proof
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofEntry {
    #[serde(alias = "pos")]
    pub position: Position,
    #[serde(alias = "h")]
    pub hash: Hash,
}

impl ProofEntry {
    pub fn left(hash: Hash) -> Self {
        ProofEntry {
            position: Position::Left,
            hash,
        }
    }

    pub fn right(hash: Hash) -> Self {
        ProofEntry {
            position: Position::Right,
            hash,
        }
    }
}

/// Walk the levels bottom-up collecting siblings
///
/// An even index with no right neighbour is paired with itself, mirroring
/// how the level above was built.
pub fn proof_from_levels(levels: &[Vec<Hash>], leaf_index: u32) -> Result<Vec<ProofEntry>> {
    let leaf_count = levels.first().map_or(0, Vec::len);
    let mut idx = leaf_index as usize;
    if idx >= leaf_count {
        return Err(Error::LeafIndexOutOfRange {
            index: leaf_index,
            len: leaf_count as u32,
        });
    }

    let mut proof = Vec::with_capacity(levels.len().saturating_sub(1));
    for level in &levels[..levels.len() - 1] {
        let entry = if idx % 2 == 1 {
            ProofEntry::left(level[idx - 1])
        } else {
            ProofEntry::right(*level.get(idx + 1).unwrap_or(&level[idx]))
        };
        proof.push(entry);
        idx /= 2;
    }
    Ok(proof)
}

/// Root implied by a leaf and its proof
pub fn fold_root(leaf: &Hash, proof: &[ProofEntry]) -> Hash {
    proof.iter().fold(*leaf, |acc, entry| match entry.position {
        Position::Left => hash_pair(&entry.hash, &acc),
        Position::Right => hash_pair(&acc, &entry.hash),
    })
}

/// Check a proof against a claimed root
///
/// A mismatch is an ordinary `false`, not an error.
pub fn verify(leaf: &Hash, proof: &[ProofEntry], claimed_root: &Hash) -> bool {
    fold_root(leaf, proof) == *claimed_root
}

/// Everything a third party needs to check that a leaf is in a tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub tree_id: String,
    pub leaf_hash: Hash,
    pub leaf_index: u32,
    #[serde(alias = "root_hash")]
    pub root: Hash,
    #[serde(default)]
    pub algo: HashAlgo,
    #[serde(default)]
    pub canon_rules: CanonRule,
    #[serde(default = "default_domain_prefix")]
    pub domain_prefix: String,
    pub proof: Vec<ProofEntry>,
}

fn default_domain_prefix() -> String {
    String::from_utf8_lossy(DOMAIN_PREFIX).into_owned()
}

impl InclusionProof {
    pub fn new(
        tree_id: impl Into<String>,
        leaf_hash: Hash,
        leaf_index: u32,
        root: Hash,
        proof: Vec<ProofEntry>,
    ) -> Self {
        InclusionProof {
            tree_id: tree_id.into(),
            leaf_hash,
            leaf_index,
            root,
            algo: HashAlgo::default(),
            canon_rules: CanonRule::default(),
            domain_prefix: default_domain_prefix(),
            proof,
        }
    }

    /// Check against the root carried in the proof itself
    pub fn verify(&self) -> bool {
        verify(&self.leaf_hash, &self.proof, &self.root)
    }

    /// Check against a root obtained elsewhere (e.g. read from a ledger)
    pub fn verify_against(&self, published_root: &Hash) -> bool {
        verify(&self.leaf_hash, &self.proof, published_root)
    }

    /// `(siblings, is_left)` as taken by an on-chain inclusion check
    pub fn ledger_form(&self) -> (Vec<Hash>, Vec<bool>) {
        self.proof
            .iter()
            .map(|e| (e.hash, e.position == Position::Left))
            .unzip()
    }
}
