//! Merkle tree with cached levels and root-path-only appends

use super::proof::{proof_from_levels, ProofEntry};
use crate::canonical::CanonRule;
use crate::model::Hash;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Hash function a tree was built with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgo {
    #[default]
    #[serde(rename = "SHA-256")]
    Sha256,
}

impl HashAlgo {
    /// Code used by ledger contracts
    pub fn as_u8(&self) -> u8 {
        match self {
            HashAlgo::Sha256 => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgo::Sha256 => "SHA-256",
        }
    }
}

/// Parent node: `SHA256(left || right)`
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    Hash::digest_many(&[left.as_bytes(), right.as_bytes()])
}

/// Build every level from scratch, leaves first, root level last
///
/// Returns no levels for no leaves.
pub fn build_levels(leaves: &[Hash]) -> Vec<Vec<Hash>> {
    if leaves.is_empty() {
        return Vec::new();
    }

    let mut levels = vec![leaves.to_vec()];
    loop {
        let level = &levels[levels.len() - 1];
        if level.len() <= 1 {
            break;
        }
        let next: Vec<Hash> = level
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
            .collect();
        levels.push(next);
    }
    levels
}

/// Root of a leaf list, `None` when empty
pub fn merkle_root(leaves: &[Hash]) -> Option<Hash> {
    build_levels(leaves)
        .last()
        .and_then(|level| level.first().copied())
}

/// Persisted form of a tree: metadata, leaves, and the root they imply
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeState {
    #[serde(default)]
    pub tree_id: String,
    #[serde(default)]
    pub algo: HashAlgo,
    #[serde(default)]
    pub canon_rules: CanonRule,
    /// Content hashes in insertion order
    pub leaves: Vec<Hash>,
    pub root: Option<Hash>,
}

/// Lifecycle position of a tree
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeShape {
    Empty,
    SingleLeaf,
    MultiLeaf,
}

/// What an append hands back to the caller
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppendOutcome {
    pub leaf_index: u32,
    pub root: Hash,
    pub proof: Vec<ProofEntry>,
}

/// An append-only Merkle tree
///
/// All levels are kept in memory. Appending recomputes only the nodes on
/// the path from the new leaf to the root, which yields the same bytes as a
/// full rebuild because every node off that path is unaffected by the new
/// leaf.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    tree_id: String,
    algo: HashAlgo,
    canon_rules: CanonRule,
    /// levels[0] = leaves, last = single root node
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Create an empty tree
    pub fn new(tree_id: impl Into<String>) -> Self {
        MerkleTree {
            tree_id: tree_id.into(),
            algo: HashAlgo::default(),
            canon_rules: CanonRule::default(),
            levels: Vec::new(),
        }
    }

    /// Build a tree from existing leaves
    pub fn from_leaves(tree_id: impl Into<String>, leaves: Vec<Hash>) -> Self {
        let mut tree = MerkleTree::new(tree_id);
        tree.levels = build_levels(&leaves);
        tree
    }

    /// Load a persisted tree, refusing state whose root does not match its
    /// leaves
    pub fn from_state(state: TreeState) -> Result<Self> {
        if state.leaves.len() > u32::MAX as usize {
            return Err(Error::Corruption(format!(
                "tree {} holds {} leaves",
                state.tree_id,
                state.leaves.len()
            )));
        }

        let levels = build_levels(&state.leaves);
        let recomputed = levels.last().and_then(|level| level.first().copied());
        if recomputed != state.root {
            return Err(Error::Corruption(format!(
                "tree {}: stored root {} but leaves give {}",
                state.tree_id,
                describe(state.root),
                describe(recomputed)
            )));
        }

        Ok(MerkleTree {
            tree_id: state.tree_id,
            algo: state.algo,
            canon_rules: state.canon_rules,
            levels,
        })
    }

    /// Snapshot for persistence
    pub fn to_state(&self) -> TreeState {
        TreeState {
            tree_id: self.tree_id.clone(),
            algo: self.algo,
            canon_rules: self.canon_rules,
            leaves: self.leaves().to_vec(),
            root: self.root(),
        }
    }

    pub fn tree_id(&self) -> &str {
        &self.tree_id
    }

    pub fn algo(&self) -> HashAlgo {
        self.algo
    }

    pub fn canon_rules(&self) -> CanonRule {
        self.canon_rules
    }

    pub fn leaves(&self) -> &[Hash] {
        self.levels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of leaves
    pub fn len(&self) -> u32 {
        self.leaves().len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn root(&self) -> Option<Hash> {
        self.levels.last().and_then(|level| level.first().copied())
    }

    pub fn shape(&self) -> TreeShape {
        match self.leaves().len() {
            0 => TreeShape::Empty,
            1 => TreeShape::SingleLeaf,
            _ => TreeShape::MultiLeaf,
        }
    }

    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }

    /// Position of a leaf, first occurrence
    pub fn position_of(&self, leaf: &Hash) -> Option<u32> {
        self.leaves()
            .iter()
            .position(|h| h == leaf)
            .map(|i| i as u32)
    }

    /// Append a leaf and return its index, the new root and its proof
    pub fn append(&mut self, leaf: Hash) -> Result<AppendOutcome> {
        if self.leaves().len() >= u32::MAX as usize {
            return Err(Error::CapacityExceeded(self.tree_id.clone()));
        }
        let leaf_index = self.len();

        self.push_leaf(leaf);

        let root = self
            .root()
            .ok_or_else(|| Error::Corruption(format!("tree {} has no root", self.tree_id)))?;
        let proof = self.proof_for(leaf_index)?;
        Ok(AppendOutcome {
            leaf_index,
            root,
            proof,
        })
    }

    /// Sibling path for a leaf against the current root
    pub fn proof_for(&self, leaf_index: u32) -> Result<Vec<ProofEntry>> {
        proof_from_levels(&self.levels, leaf_index)
    }

    /// Drop leaves past `len`; only used to undo an append that could not
    /// be persisted
    pub(crate) fn truncate(&mut self, len: usize) {
        let mut leaves = self.leaves().to_vec();
        leaves.truncate(len);
        self.levels = build_levels(&leaves);
    }

    fn push_leaf(&mut self, leaf: Hash) {
        if self.levels.is_empty() {
            self.levels.push(Vec::new());
        }
        self.levels[0].push(leaf);

        let mut idx = self.levels[0].len() - 1;
        let mut depth = 0;
        while self.levels[depth].len() > 1 {
            let parent = {
                let level = &self.levels[depth];
                let left = idx & !1;
                hash_pair(&level[left], level.get(left + 1).unwrap_or(&level[left]))
            };
            let parent_idx = idx / 2;

            if self.levels.len() == depth + 1 {
                self.levels.push(Vec::new());
            }
            let above = &mut self.levels[depth + 1];
            if parent_idx < above.len() {
                above[parent_idx] = parent;
            } else {
                above.push(parent);
            }

            idx = parent_idx;
            depth += 1;
        }
    }
}

fn describe(root: Option<Hash>) -> String {
    root.map(|h| h.to_hex()).unwrap_or_else(|| "null".to_string())
}
