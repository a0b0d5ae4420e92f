//! Persistence adapters
//!
//! The engine needs load-full-tree / replace-full-tree by `(identity,
//! window)` and an archive of committed leaves. How that lands on disk is
//! the adapter's business: [`MemoryStore`] keeps everything in maps,
//! [`FileStore`] writes one file per identity, as JSON or as a compressed
//! binary snapshot.

mod archive;
mod compact;
mod file_store;
mod memory;

pub use archive::{ArchivedLeaf, IdentityFile};
pub use compact::{decode_compact, encode_compact};
pub use file_store::{FileStore, StoreFormat};
pub use memory::MemoryStore;

use crate::merkle::TreeState;
use crate::model::{Hash, TreeKey};
use crate::Result;
use std::sync::Arc;

/// Storage seam between the engine and wherever trees live
pub trait TreeStore: Send + Sync {
    /// Full state of one tree, `None` if it was never created
    fn load_tree(&self, key: &TreeKey) -> Result<Option<TreeState>>;

    /// Overwrite the full state of one tree
    fn replace_tree(&self, key: &TreeKey, state: &TreeState) -> Result<()>;

    /// Every tree of an identity, sorted by tree id
    fn list_trees(&self, identity: &str) -> Result<Vec<TreeState>>;

    /// Add a committed leaf to the identity's archive
    fn archive_leaf(&self, identity: &str, leaf: &ArchivedLeaf) -> Result<()>;

    /// Look a leaf up in the archive by content hash
    fn find_leaf(&self, identity: &str, content_hash: &Hash) -> Result<Option<ArchivedLeaf>>;

    /// Persist a tree together with the leaf that was just appended to it
    ///
    /// Adapters that can do both in one write should override this.
    fn commit(&self, key: &TreeKey, state: &TreeState, leaf: &ArchivedLeaf) -> Result<()> {
        self.replace_tree(key, state)?;
        self.archive_leaf(&key.identity, leaf)
    }
}

impl<T: TreeStore + ?Sized> TreeStore for Arc<T> {
    fn load_tree(&self, key: &TreeKey) -> Result<Option<TreeState>> {
        (**self).load_tree(key)
    }

    fn replace_tree(&self, key: &TreeKey, state: &TreeState) -> Result<()> {
        (**self).replace_tree(key, state)
    }

    fn list_trees(&self, identity: &str) -> Result<Vec<TreeState>> {
        (**self).list_trees(identity)
    }

    fn archive_leaf(&self, identity: &str, leaf: &ArchivedLeaf) -> Result<()> {
        (**self).archive_leaf(identity, leaf)
    }

    fn find_leaf(&self, identity: &str, content_hash: &Hash) -> Result<Option<ArchivedLeaf>> {
        (**self).find_leaf(identity, content_hash)
    }

    fn commit(&self, key: &TreeKey, state: &TreeState, leaf: &ArchivedLeaf) -> Result<()> {
        (**self).commit(key, state, leaf)
    }
}
