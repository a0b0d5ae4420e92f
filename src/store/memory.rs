//! In-memory store, for tests and for callers that persist elsewhere

use super::{ArchivedLeaf, TreeStore};
use crate::merkle::TreeState;
use crate::model::{Hash, TreeKey};
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryStore {
    trees: RwLock<HashMap<TreeKey, TreeState>>,
    archive: RwLock<HashMap<String, Vec<ArchivedLeaf>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of archived leaves for an identity
    pub fn archived_count(&self, identity: &str) -> usize {
        self.archive.read().get(identity).map_or(0, Vec::len)
    }
}

impl TreeStore for MemoryStore {
    fn load_tree(&self, key: &TreeKey) -> Result<Option<TreeState>> {
        Ok(self.trees.read().get(key).cloned())
    }

    fn replace_tree(&self, key: &TreeKey, state: &TreeState) -> Result<()> {
        self.trees.write().insert(key.clone(), state.clone());
        Ok(())
    }

    fn list_trees(&self, identity: &str) -> Result<Vec<TreeState>> {
        let trees = self.trees.read();
        let mut states: Vec<TreeState> = trees
            .iter()
            .filter(|(key, _)| key.identity == identity)
            .map(|(_, state)| state.clone())
            .collect();
        states.sort_by(|a, b| a.tree_id.cmp(&b.tree_id));
        Ok(states)
    }

    fn archive_leaf(&self, identity: &str, leaf: &ArchivedLeaf) -> Result<()> {
        self.archive
            .write()
            .entry(identity.to_string())
            .or_default()
            .push(leaf.clone());
        Ok(())
    }

    fn find_leaf(&self, identity: &str, content_hash: &Hash) -> Result<Option<ArchivedLeaf>> {
        Ok(self
            .archive
            .read()
            .get(identity)
            .and_then(|leaves| leaves.iter().find(|l| l.content_hash == *content_hash))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::MerkleTree;
    use crate::model::WindowKey;

    #[test]
    fn test_trees_scoped_by_identity() {
        let store = MemoryStore::new();
        let day = WindowKey::from_tree_id("2024-01-02");
        let a = TreeKey::new("alice", day.clone());
        let b = TreeKey::new("bob", day);

        let tree = MerkleTree::from_leaves("2024-01-02", vec![Hash::digest(b"a")]);
        store.replace_tree(&a, &tree.to_state()).unwrap();

        assert!(store.load_tree(&a).unwrap().is_some());
        assert!(store.load_tree(&b).unwrap().is_none());
        assert_eq!(store.list_trees("alice").unwrap().len(), 1);
        assert!(store.list_trees("bob").unwrap().is_empty());
    }

    #[test]
    fn test_list_sorted_by_tree_id() {
        let store = MemoryStore::new();
        for id in ["2024-03-01", "2024-01-01", "2024-02-01"] {
            let key = TreeKey::new("alice", WindowKey::from_tree_id(id));
            store
                .replace_tree(&key, &MerkleTree::new(id).to_state())
                .unwrap();
        }
        let ids: Vec<String> = store
            .list_trees("alice")
            .unwrap()
            .into_iter()
            .map(|s| s.tree_id)
            .collect();
        assert_eq!(ids, ["2024-01-01", "2024-02-01", "2024-03-01"]);
    }
}
