//! Error types for notary_tree

use thiserror::Error;

/// Result type alias for notary_tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in notary_tree operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    /// Rejected before anything was hashed or committed
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Value cannot be canonicalized: {0}")]
    NonCanonical(String),

    /// Stored state disagrees with what its own leaves imply
    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Invalid store file: {0}")]
    InvalidFile(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Leaf index {index} out of range for tree with {len} leaves")]
    LeafIndexOutOfRange { index: u32, len: u32 },

    #[error("Tree {0} is full")]
    CapacityExceeded(String),

    #[error("Anchor error: {0}")]
    Anchor(String),

    #[error("Config error: {0}")]
    Config(String),
}
