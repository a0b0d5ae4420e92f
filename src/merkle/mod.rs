//! Append-only binary Merkle trees
//!
//! This implements the commitment structure behind every notarized leaf:
//! - Each parent is `SHA256(left || right)`
//! - A level with an odd node count pairs its last node with itself
//! - A single-leaf tree's root is the leaf itself; an empty tree has no root
//!
//! The duplicate-last-node rule is not Bitcoin's serialization-time
//! duplication. Any external verifier has to replicate it exactly.

mod proof;
mod tree;

pub use proof::{fold_root, proof_from_levels, verify, InclusionProof, Position, ProofEntry};
pub use tree::{
    build_levels, hash_pair, merkle_root, AppendOutcome, HashAlgo, MerkleTree, TreeShape,
    TreeState,
};
