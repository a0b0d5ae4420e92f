//! Core data model types for notary_tree

mod hash;
mod record;
mod window;

pub use hash::Hash;
pub use record::{Record, RecordInput, NONCE_LEN};
pub use window::{TreeKey, WindowKey};
