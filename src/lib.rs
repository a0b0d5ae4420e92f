//! # notary_tree
//!
//! Tamper-evident notarization of records with per-window Merkle trees.
//!
//! Each record is canonicalized, hashed under a domain prefix and appended as
//! a leaf to the tree for its identity and UTC day. The engine returns a
//! receipt carrying the new root and an inclusion proof that anyone can check
//! without access to the store.
//!
//! ## Core Concepts
//!
//! - **Canonical form**: key-order independent JSON bytes
//! - **Leaves**: `SHA256("MSGv1|" || canonical)` of a nonce-sealed record
//! - **Trees**: append-only, one per `(identity, day)`
//! - **Proofs**: sibling paths, verified by folding back to the root
//! - **Anchoring**: roots handed to a ledger adapter as 32-byte digests
//!
//! ## Example
//!
//! ```ignore
//! use notary_tree::{Config, Notary, RecordInput};
//!
//! let notary = Notary::open(Config::load()?)?;
//! let receipt = notary.notarize(RecordInput::new("alice", 1_700_000_000, "hello"))?;
//! assert!(receipt.inclusion_proof().verify());
//! ```

pub mod anchor;
pub mod canonical;
pub mod config;
pub mod hasher;
pub mod merkle;
pub mod model;
pub mod store;

mod error;
mod notary;

pub use anchor::{Anchor, AnchorPayload, AnchorStatus, LeafRegistration, MemoryLedger, VectorCommitMode};
pub use canonical::{canonicalize, CanonRule};
pub use config::Config;
pub use error::{Error, Result};
pub use hasher::{hash_leaf, ConfidentialTag, InsecureDemoTag, DOMAIN_PREFIX};
pub use merkle::{verify, InclusionProof, MerkleTree, Position, ProofEntry};
pub use model::{Hash, Record, RecordInput, TreeKey, WindowKey};
pub use notary::{Appended, Exchange, Notary, Receipt, TreeSummary};
pub use store::{FileStore, MemoryStore, StoreFormat, TreeStore};

/// Store format version for compatibility
pub const VERSION: u32 = 1;

/// Magic bytes for compact store files
pub const MAGIC: &[u8; 8] = b"NOTARYDB";
