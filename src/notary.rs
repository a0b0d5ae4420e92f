//! High-level notarization API
//!
//! [`Notary`] ties the pieces together: it seals records, hashes them,
//! appends them to the right tree, persists through a [`TreeStore`] and
//! hands back receipts and proofs.

use crate::anchor::{Anchor, AnchorPayload, AnchorStatus, LeafRegistration};
use crate::canonical::CanonRule;
use crate::config::Config;
use crate::hasher::{self, ConfidentialTag, InsecureDemoTag};
use crate::merkle::{HashAlgo, InclusionProof, MerkleTree, ProofEntry};
use crate::model::{Hash, Record, RecordInput, TreeKey, WindowKey};
use crate::store::{ArchivedLeaf, FileStore, TreeStore};
use crate::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What a caller gets back for a notarized record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub content_hash: Hash,
    pub tree_id: String,
    pub leaf_index: u32,
    /// Root right after this leaf was appended
    pub root: Hash,
    pub proof: Vec<ProofEntry>,
    pub canonical_json: String,
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidential_tag: Option<ConfidentialTag>,
}

impl Receipt {
    /// Self-contained proof against the root issued with this receipt
    pub fn inclusion_proof(&self) -> InclusionProof {
        InclusionProof::new(
            self.tree_id.clone(),
            self.content_hash,
            self.leaf_index,
            self.root,
            self.proof.clone(),
        )
    }
}

/// Result of a bare hash append
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appended {
    pub tree_id: String,
    pub leaf_index: u32,
    pub root: Hash,
    pub proof: Vec<ProofEntry>,
}

/// Both halves of a chat exchange
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: Receipt,
    pub assistant: Receipt,
}

/// One line of a tree listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSummary {
    pub tree_id: String,
    pub root: Option<Hash>,
    pub algo: HashAlgo,
    pub canon_rules: CanonRule,
    pub leaf_count: u32,
}

impl TreeSummary {
    fn of(tree: &MerkleTree) -> Self {
        TreeSummary {
            tree_id: tree.tree_id().to_string(),
            root: tree.root(),
            algo: tree.algo(),
            canon_rules: tree.canon_rules(),
            leaf_count: tree.len(),
        }
    }
}

type TreeHandle = Arc<RwLock<MerkleTree>>;

/// The notarization engine
///
/// Appends to one `(identity, window)` tree are serialized by that tree's
/// write lock; everything else runs in parallel.
pub struct Notary<S: TreeStore> {
    store: S,
    config: Config,
    /// Trees touched so far, loaded lazily from the store. Grows with every
    /// window used until [`Notary::evict_before`] drops past ones.
    trees: RwLock<HashMap<TreeKey, TreeHandle>>,
}

impl Notary<FileStore> {
    /// Open the file-backed engine described by a config
    pub fn open(config: Config) -> Result<Self> {
        let store = FileStore::open(&config.data_dir, config.store_format)?;
        Ok(Notary::new(store, config))
    }
}

impl<S: TreeStore> Notary<S> {
    pub fn new(store: S, config: Config) -> Self {
        Notary {
            store,
            config,
            trees: RwLock::new(HashMap::new()),
        }
    }

    /// Engine over a store with default configuration
    pub fn with_store(store: S) -> Self {
        Notary::new(store, Config::default())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // === Notarization ===

    /// Seal a record with a fresh nonce and commit it
    pub fn notarize(&self, input: RecordInput) -> Result<Receipt> {
        let record = input.seal()?;
        self.notarize_sealed(record)
    }

    /// Commit an already sealed record
    pub fn notarize_sealed(&self, record: Record) -> Result<Receipt> {
        let (content_hash, canonical) = hasher::hash_leaf(&record)?;
        let canonical_json = String::from_utf8(canonical)
            .map_err(|e| Error::NonCanonical(format!("canonical form is not UTF-8: {}", e)))?;
        let key = TreeKey::new(record.identity.clone(), record.window()?);
        let confidential_tag = self
            .config
            .insecure_demo_tag
            .then(|| ConfidentialTag::InsecureDemo(InsecureDemoTag::derive(&content_hash)));

        let handle = self.tree_handle(&key)?;
        let mut tree = handle.write();
        let outcome = tree.append(content_hash)?;

        let archived = ArchivedLeaf {
            user_id: record.identity,
            created: record.created,
            provider: record.provider,
            model: record.model,
            content: record.content,
            system_fingerprint: record.system_fingerprint,
            nonce: record.nonce.clone(),
            content_type: record.content_type,
            content_hash,
            content_hash_fhe: confidential_tag.as_ref().map(ToString::to_string),
            canonical_json: canonical_json.clone(),
            tree_id: key.tree_id().to_string(),
            leaf_index: outcome.leaf_index,
            proof: outcome.proof.clone(),
        };

        if let Err(e) = self.store.commit(&key, &tree.to_state(), &archived) {
            tree.truncate(outcome.leaf_index as usize);
            warn!(tree = %key, leaf_index = outcome.leaf_index, error = %e, "persist failed, append rolled back");
            return Err(e);
        }

        info!(
            tree = %key,
            leaf_index = outcome.leaf_index,
            hash = %content_hash.short(),
            "leaf committed"
        );

        Ok(Receipt {
            content_hash,
            tree_id: key.tree_id().to_string(),
            leaf_index: outcome.leaf_index,
            root: outcome.root,
            proof: outcome.proof,
            canonical_json,
            nonce: record.nonce,
            confidential_tag,
        })
    }

    /// Notarize a user message and the assistant reply to it
    ///
    /// Both share the user record's `created`, so they land in the same
    /// tree, user first.
    pub fn notarize_exchange(
        &self,
        user: RecordInput,
        reply: impl Into<Value>,
    ) -> Result<Exchange> {
        let mut assistant = user.clone().with_content_type("assistant");
        assistant.content = Some(reply.into());

        let user = self.notarize(user.with_content_type("user"))?;
        let assistant = self.notarize(assistant)?;
        Ok(Exchange { user, assistant })
    }

    /// Append a bare content hash to an identity's tree for a window
    ///
    /// Nothing is archived; only the tree is persisted.
    pub fn append(&self, identity: &str, window: &WindowKey, content_hash: Hash) -> Result<Appended> {
        if identity.trim().is_empty() {
            return Err(Error::MalformedRecord("identity is empty".into()));
        }
        let key = TreeKey::new(identity, window.clone());
        let handle = self.tree_handle(&key)?;
        let mut tree = handle.write();
        let outcome = tree.append(content_hash)?;

        if let Err(e) = self.store.replace_tree(&key, &tree.to_state()) {
            tree.truncate(outcome.leaf_index as usize);
            warn!(tree = %key, error = %e, "persist failed, append rolled back");
            return Err(e);
        }
        debug!(tree = %key, leaf_index = outcome.leaf_index, "hash appended");

        Ok(Appended {
            tree_id: key.tree_id().to_string(),
            leaf_index: outcome.leaf_index,
            root: outcome.root,
            proof: outcome.proof,
        })
    }

    // === Proofs ===

    /// Proof for a leaf position against the tree's current root
    pub fn proof_for(&self, key: &TreeKey, leaf_index: u32) -> Result<InclusionProof> {
        let handle = self
            .existing_tree(key)?
            .ok_or_else(|| Error::NotFound(format!("tree {}", key)))?;
        let tree = handle.read();
        proof_in(&tree, leaf_index)
    }

    /// Find a leaf by content hash in any of the identity's trees and prove
    /// it against that tree's current root
    pub fn proof_for_hash(&self, identity: &str, content_hash: &Hash) -> Result<InclusionProof> {
        for state in self.store.list_trees(identity)? {
            let key = TreeKey::new(identity, WindowKey::from_tree_id(state.tree_id));
            let Some(handle) = self.existing_tree(&key)? else {
                continue;
            };
            let tree = handle.read();
            if let Some(index) = tree.position_of(content_hash) {
                return proof_in(&tree, index);
            }
        }
        Err(Error::NotFound(format!(
            "leaf {} for identity {}",
            content_hash, identity
        )))
    }

    // === Trees ===

    /// All trees of an identity, sorted by tree id
    pub fn trees(&self, identity: &str) -> Result<Vec<TreeSummary>> {
        let mut summaries = Vec::new();
        for state in self.store.list_trees(identity)? {
            let key = TreeKey::new(identity, WindowKey::from_tree_id(state.tree_id));
            if let Some(handle) = self.existing_tree(&key)? {
                summaries.push(TreeSummary::of(&handle.read()));
            }
        }
        Ok(summaries)
    }

    /// The identity's most recent tree
    pub fn latest_tree(&self, identity: &str) -> Result<Option<TreeSummary>> {
        Ok(self.trees(identity)?.pop())
    }

    // === Archive and anchoring ===

    pub fn find_leaf(&self, identity: &str, content_hash: &Hash) -> Result<Option<ArchivedLeaf>> {
        self.store.find_leaf(identity, content_hash)
    }

    /// Payload to hand an anchoring adapter for one tree
    pub fn anchor_payload(&self, identity: &str, tree_id: &str) -> Result<AnchorPayload> {
        let key = TreeKey::new(identity, WindowKey::from_tree_id(tree_id));
        let handle = self
            .existing_tree(&key)?
            .ok_or_else(|| Error::NotFound(format!("tree {}", key)))?;
        let state = handle.read().to_state();
        AnchorPayload::for_tree(&state)
    }

    /// Publish a tree's current root through an adapter
    ///
    /// Failures are returned as-is; the engine never retries.
    pub fn anchor(&self, identity: &str, tree_id: &str, anchor: &dyn Anchor) -> Result<AnchorStatus> {
        let payload = self.anchor_payload(identity, tree_id)?;
        let status = anchor.publish(&payload)?;
        info!(identity, tree_id, root = %payload.root.short(), ?status, "root anchored");
        Ok(status)
    }

    /// Per-leaf ledger registration for an archived leaf
    pub fn leaf_registration(&self, identity: &str, content_hash: &Hash) -> Result<LeafRegistration> {
        let leaf = self
            .find_leaf(identity, content_hash)?
            .ok_or_else(|| Error::NotFound(format!("leaf {}", content_hash)))?;
        LeafRegistration::from_archived(&leaf, self.config.vector_commit)
    }

    // === Cache ===

    /// Number of trees held in memory
    pub fn cached_trees(&self) -> usize {
        self.trees.read().len()
    }

    /// Drop cached trees of windows before `window`
    ///
    /// Trees still held by a caller stay. Dropped trees reload from the store
    /// on next use. Returns how many were dropped.
    pub fn evict_before(&self, window: &WindowKey) -> usize {
        let mut trees = self.trees.write();
        let before = trees.len();
        trees.retain(|key, handle| key.window >= *window || Arc::strong_count(handle) > 1);
        let evicted = before - trees.len();
        if evicted > 0 {
            debug!(evicted, before = %window.as_str(), "trees evicted");
        }
        evicted
    }

    // === Internal ===

    /// Handle for a tree, creating an empty one if it does not exist yet
    fn tree_handle(&self, key: &TreeKey) -> Result<TreeHandle> {
        if let Some(handle) = self.existing_tree(key)? {
            return Ok(handle);
        }
        debug!(tree = %key, "creating tree");
        let fresh = Arc::new(RwLock::new(MerkleTree::new(key.tree_id())));
        Ok(self.trees.write().entry(key.clone()).or_insert(fresh).clone())
    }

    /// Handle for a tree already in memory or in the store
    fn existing_tree(&self, key: &TreeKey) -> Result<Option<TreeHandle>> {
        if let Some(handle) = self.trees.read().get(key) {
            return Ok(Some(handle.clone()));
        }

        let Some(state) = self.store.load_tree(key)? else {
            return Ok(None);
        };
        let tree = MerkleTree::from_state(state).map_err(|e| {
            error!(tree = %key, error = %e, "stored tree failed verification");
            e
        })?;
        debug!(tree = %key, leaves = tree.len(), "tree loaded");

        // Another thread may have loaded it meanwhile; keep whichever landed first
        let fresh = Arc::new(RwLock::new(tree));
        Ok(Some(
            self.trees.write().entry(key.clone()).or_insert(fresh).clone(),
        ))
    }
}

fn proof_in(tree: &MerkleTree, leaf_index: u32) -> Result<InclusionProof> {
    let proof = tree.proof_for(leaf_index)?;
    let root = tree
        .root()
        .ok_or_else(|| Error::NotFound(format!("tree {} is empty", tree.tree_id())))?;
    let leaf_hash = tree.leaves()[leaf_index as usize];
    let mut inclusion = InclusionProof::new(tree.tree_id(), leaf_hash, leaf_index, root, proof);
    inclusion.algo = tree.algo();
    inclusion.canon_rules = tree.canon_rules();
    Ok(inclusion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::MemoryLedger;
    use crate::merkle::{self, TreeState};
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    const DAY: u64 = 1_710_000_000; // 2024-03-09

    fn notary() -> Notary<MemoryStore> {
        Notary::with_store(MemoryStore::new())
    }

    fn input(identity: &str, created: u64, content: &str) -> RecordInput {
        RecordInput::new(identity, created, content).with_provider("openai", "gpt-4o-mini")
    }

    /// Store whose writes can be made to fail
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail: AtomicBool,
    }

    impl TreeStore for FlakyStore {
        fn load_tree(&self, key: &TreeKey) -> Result<Option<TreeState>> {
            self.inner.load_tree(key)
        }

        fn replace_tree(&self, key: &TreeKey, state: &TreeState) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")));
            }
            self.inner.replace_tree(key, state)
        }

        fn list_trees(&self, identity: &str) -> Result<Vec<TreeState>> {
            self.inner.list_trees(identity)
        }

        fn archive_leaf(&self, identity: &str, leaf: &ArchivedLeaf) -> Result<()> {
            self.inner.archive_leaf(identity, leaf)
        }

        fn find_leaf(&self, identity: &str, content_hash: &Hash) -> Result<Option<ArchivedLeaf>> {
            self.inner.find_leaf(identity, content_hash)
        }
    }

    #[test]
    fn test_notarize_returns_verifiable_receipt() {
        let notary = notary();
        let receipt = notary.notarize(input("alice", DAY, "hello")).unwrap();

        assert_eq!(receipt.tree_id, "2024-03-09");
        assert_eq!(receipt.leaf_index, 0);
        assert_eq!(receipt.root, receipt.content_hash);
        assert!(receipt.proof.is_empty());
        assert!(receipt.inclusion_proof().verify());
        assert!(receipt.confidential_tag.is_none());
        assert_eq!(
            hasher::hash_canonical(receipt.canonical_json.as_bytes()),
            receipt.content_hash
        );
    }

    #[test]
    fn test_leaf_indices_are_sequential() {
        let notary = notary();
        for i in 0..10u32 {
            let receipt = notary.notarize(input("alice", DAY, &format!("m{}", i))).unwrap();
            assert_eq!(receipt.leaf_index, i);
        }
        let summary = notary.latest_tree("alice").unwrap().unwrap();
        assert_eq!(summary.leaf_count, 10);
    }

    #[test]
    fn test_same_content_gets_distinct_leaves() {
        let notary = notary();
        let a = notary.notarize(input("alice", DAY, "same")).unwrap();
        let b = notary.notarize(input("alice", DAY, "same")).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.content_hash, b.content_hash);
        assert_eq!(b.leaf_index, 1);
    }

    #[test]
    fn test_window_boundary_splits_trees() {
        let notary = notary();
        let before = notary.notarize(input("alice", 1_710_028_799, "late")).unwrap();
        let after = notary.notarize(input("alice", 1_710_028_800, "early")).unwrap();

        assert_eq!(before.tree_id, "2024-03-09");
        assert_eq!(after.tree_id, "2024-03-10");
        assert_eq!(after.leaf_index, 0);

        let ids: Vec<String> = notary
            .trees("alice")
            .unwrap()
            .into_iter()
            .map(|t| t.tree_id)
            .collect();
        assert_eq!(ids, ["2024-03-09", "2024-03-10"]);
    }

    #[test]
    fn test_identities_are_isolated() {
        let notary = notary();
        notary.notarize(input("alice", DAY, "a")).unwrap();
        let bob = notary.notarize(input("bob", DAY, "b")).unwrap();
        assert_eq!(bob.leaf_index, 0);
        assert_eq!(notary.trees("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_input_commits_nothing() {
        let notary = notary();
        let mut missing = input("alice", DAY, "x");
        missing.content = None;
        assert!(matches!(notary.notarize(missing), Err(Error::MalformedRecord(_))));
        assert!(matches!(
            notary.notarize(input("  ", DAY, "x")),
            Err(Error::MalformedRecord(_))
        ));
        assert!(matches!(
            notary.notarize(input("alice", u64::MAX, "x")),
            Err(Error::MalformedRecord(_))
        ));
        assert!(notary.trees("alice").unwrap().is_empty());
    }

    #[test]
    fn test_null_content_is_hashed() {
        let notary = notary();
        let receipt = notary
            .notarize(RecordInput::new("alice", DAY, Value::Null))
            .unwrap();
        assert!(receipt.canonical_json.contains(r#""content":null"#));
    }

    #[test]
    fn test_proof_for_hash_uses_current_root() {
        let notary = notary();
        let first = notary.notarize(input("alice", DAY, "one")).unwrap();
        let last = notary.notarize(input("alice", DAY, "two")).unwrap();
        notary.notarize(input("alice", DAY, "three")).unwrap();

        let proof = notary.proof_for_hash("alice", &first.content_hash).unwrap();
        assert_eq!(proof.leaf_index, 0);
        assert_ne!(proof.root, first.root);
        assert!(proof.verify());
        assert_eq!(proof.root, notary.latest_tree("alice").unwrap().unwrap().root.unwrap());

        // the root issued at append time still checks the old proof
        assert!(last.inclusion_proof().verify());

        let missing = notary.proof_for_hash("alice", &Hash::digest(b"nope"));
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_proof_for_index() {
        let notary = notary();
        for c in ["a", "b", "c"] {
            notary.notarize(input("alice", DAY, c)).unwrap();
        }
        let key = TreeKey::new("alice", WindowKey::from_tree_id("2024-03-09"));
        let proof = notary.proof_for(&key, 2).unwrap();
        assert_eq!(proof.proof.len(), 2);
        assert!(proof.verify());
        assert!(matches!(
            notary.proof_for(&key, 3),
            Err(Error::LeafIndexOutOfRange { index: 3, len: 3 })
        ));

        let unknown = TreeKey::new("bob", WindowKey::from_tree_id("2024-03-09"));
        assert!(matches!(notary.proof_for(&unknown, 0), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_append_bare_hash() {
        let notary = notary();
        let window = WindowKey::from_tree_id("2024-01-01");
        let leaves: Vec<Hash> = (0..5u8).map(|i| Hash::digest(&[i])).collect();
        let mut last = None;
        for leaf in &leaves {
            last = Some(notary.append("alice", &window, *leaf).unwrap());
        }
        let last = last.unwrap();
        assert_eq!(last.leaf_index, 4);
        assert_eq!(Some(last.root), merkle::merkle_root(&leaves));
        assert!(merkle::verify(&leaves[4], &last.proof, &last.root));
    }

    #[test]
    fn test_reload_from_shared_store() {
        let store = Arc::new(MemoryStore::new());
        let receipt = {
            let notary = Notary::with_store(store.clone());
            notary.notarize(input("alice", DAY, "a")).unwrap();
            notary.notarize(input("alice", DAY, "b")).unwrap()
        };

        let notary = Notary::with_store(store.clone());
        let next = notary.notarize(input("alice", DAY, "c")).unwrap();
        assert_eq!(next.leaf_index, 2);
        let proof = notary.proof_for_hash("alice", &receipt.content_hash).unwrap();
        assert!(proof.verify());
        assert_eq!(store.archived_count("alice"), 3);
    }

    #[test]
    fn test_corrupt_tree_is_reported_not_overwritten() {
        let store = Arc::new(MemoryStore::new());
        let key = TreeKey::new("alice", WindowKey::from_tree_id("2024-03-09"));
        let mut state =
            MerkleTree::from_leaves("2024-03-09", vec![Hash::digest(b"a"), Hash::digest(b"b")])
                .to_state();
        state.root = Some(Hash::digest(b"forged"));
        store.replace_tree(&key, &state).unwrap();

        let notary = Notary::with_store(store.clone());
        let result = notary.notarize(input("alice", DAY, "c"));
        assert!(matches!(result, Err(Error::Corruption(_))));
        assert_eq!(store.load_tree(&key).unwrap().unwrap(), state);
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let notary = Notary::with_store(FlakyStore::default());
        notary.notarize(input("alice", DAY, "kept")).unwrap();

        notary.store().fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            notary.notarize(input("alice", DAY, "lost")),
            Err(Error::Io(_))
        ));

        notary.store().fail.store(false, Ordering::SeqCst);
        let next = notary.notarize(input("alice", DAY, "after")).unwrap();
        assert_eq!(next.leaf_index, 1);
        assert!(notary
            .proof_for_hash("alice", &next.content_hash)
            .unwrap()
            .verify());
    }

    #[test]
    fn test_concurrent_appends_same_tree() {
        let notary = notary();
        std::thread::scope(|s| {
            for t in 0..8 {
                let notary = &notary;
                s.spawn(move || {
                    for i in 0..25 {
                        notary
                            .notarize(input("alice", DAY, &format!("{}-{}", t, i)))
                            .unwrap();
                    }
                });
            }
        });

        let key = TreeKey::new("alice", WindowKey::from_tree_id("2024-03-09"));
        let state = notary.store().load_tree(&key).unwrap().unwrap();
        assert_eq!(state.leaves.len(), 200);
        assert_eq!(state.root, merkle::merkle_root(&state.leaves));
        for i in [0u32, 99, 199] {
            assert!(notary.proof_for(&key, i).unwrap().verify());
        }
    }

    #[test]
    fn test_exchange_shares_tree() {
        let notary = notary();
        let exchange = notary
            .notarize_exchange(input("alice", DAY, "question"), "answer")
            .unwrap();
        assert_eq!(exchange.user.tree_id, exchange.assistant.tree_id);
        assert_eq!(exchange.assistant.leaf_index, exchange.user.leaf_index + 1);
        assert!(exchange.user.canonical_json.contains(r#""content_type":"user""#));
        assert!(exchange
            .assistant
            .canonical_json
            .contains(r#""content":"answer""#));
    }

    #[test]
    fn test_demo_tag_only_when_enabled() {
        let config = Config {
            insecure_demo_tag: true,
            ..Config::default()
        };
        let notary = Notary::new(MemoryStore::new(), config);
        let receipt = notary.notarize(input("alice", DAY, "x")).unwrap();
        let tag = receipt.confidential_tag.unwrap();
        assert!(tag.is_insecure());

        let archived = notary.find_leaf("alice", &receipt.content_hash).unwrap().unwrap();
        assert_eq!(archived.content_hash_fhe, Some(tag.to_string()));
        assert!(archived.rehash_matches().unwrap());
    }

    #[test]
    fn test_evicted_tree_reloads_from_store() {
        let notary = notary();
        let old = notary.notarize(input("alice", DAY, "old")).unwrap();
        notary.notarize(input("alice", DAY + 86_400, "new")).unwrap();
        notary.notarize(input("bob", DAY, "other")).unwrap();
        assert_eq!(notary.cached_trees(), 3);

        let today = WindowKey::utc_day(DAY + 86_400).unwrap();
        assert_eq!(notary.evict_before(&today), 2);
        assert_eq!(notary.cached_trees(), 1);
        assert_eq!(notary.evict_before(&today), 0);

        let proof = notary.proof_for_hash("alice", &old.content_hash).unwrap();
        assert!(proof.verify());
        assert_eq!(proof.root, old.root);
        let next = notary.notarize(input("alice", DAY, "later")).unwrap();
        assert_eq!(next.leaf_index, 1);
        assert_eq!(notary.cached_trees(), 2);
    }

    #[test]
    fn test_anchor_and_registration() {
        let notary = notary();
        let receipt = notary.notarize(input("alice", DAY, "x")).unwrap();

        let payload = notary.anchor_payload("alice", "2024-03-09").unwrap();
        assert_eq!(payload.root, receipt.root);
        assert_eq!(payload.tree_id_hash, crate::anchor::tree_id_hash("2024-03-09"));

        let ledger = MemoryLedger::new();
        assert_eq!(
            notary.anchor("alice", "2024-03-09", &ledger).unwrap(),
            AnchorStatus::Registered
        );
        assert!(matches!(
            notary.anchor_payload("alice", "1999-01-01"),
            Err(Error::NotFound(_))
        ));

        let registration = notary
            .leaf_registration("alice", &receipt.content_hash)
            .unwrap();
        assert_eq!(registration.leaf, receipt.content_hash);
        assert_eq!(registration.identity, "alice");
        assert!(!registration.vector_commit.is_zero());
    }
}
