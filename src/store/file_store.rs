//! One file per identity under a data directory
//!
//! Every write rewrites the identity's whole file through a temporary file
//! and a rename, so a crash leaves either the old or the new file.

use super::{compact, ArchivedLeaf, IdentityFile, TreeStore};
use crate::merkle::TreeState;
use crate::model::{Hash, TreeKey};
use crate::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// On-disk encoding of identity files
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// Pretty JSON, readable and diffable
    #[default]
    Json,
    /// zstd-compressed bincode with a checksummed header
    Compact,
}

impl StoreFormat {
    fn extension(&self) -> &'static str {
        match self {
            StoreFormat::Json => "json",
            StoreFormat::Compact => "notary",
        }
    }
}

impl std::str::FromStr for StoreFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(StoreFormat::Json),
            "compact" => Ok(StoreFormat::Compact),
            other => Err(Error::Config(format!("unknown store format: {}", other))),
        }
    }
}

/// File-backed [`TreeStore`]
pub struct FileStore {
    dir: PathBuf,
    format: StoreFormat,
    /// identity → lock serializing read-modify-write of its file
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileStore {
    /// Open (creating if needed) a data directory
    pub fn open(dir: impl AsRef<Path>, format: StoreFormat) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(FileStore {
            dir,
            format,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    /// Path of an identity's file
    pub fn path_for(&self, identity: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", file_stem(identity), self.format.extension()))
    }

    /// Read everything stored for an identity (empty if no file yet)
    pub fn read_identity(&self, identity: &str) -> Result<IdentityFile> {
        let path = self.path_for(identity);
        if !path.exists() {
            return Ok(IdentityFile::default());
        }
        let data = fs::read(&path)?;
        match self.format {
            StoreFormat::Json => {
                let file: IdentityFile = serde_json::from_slice(&data)?;
                Ok(file.normalize())
            }
            StoreFormat::Compact => compact::decode_compact(&data),
        }
    }

    fn write_identity(&self, identity: &str, file: &IdentityFile) -> Result<()> {
        let data = match self.format {
            StoreFormat::Json => serde_json::to_vec_pretty(file)?,
            StoreFormat::Compact => compact::encode_compact(file)?,
        };

        let path = self.path_for(identity);
        let tmp = path.with_extension(format!("{}.tmp", self.format.extension()));
        {
            let mut out = fs::File::create(&tmp)?;
            out.write_all(&data)?;
            out.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn identity_lock(&self, identity: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(identity.to_string())
            .or_default()
            .clone()
    }

    fn update(&self, identity: &str, apply: impl FnOnce(&mut IdentityFile)) -> Result<()> {
        let lock = self.identity_lock(identity);
        let _guard = lock.lock();
        let mut file = self.read_identity(identity)?;
        apply(&mut file);
        self.write_identity(identity, &file)
    }
}

impl TreeStore for FileStore {
    fn load_tree(&self, key: &TreeKey) -> Result<Option<TreeState>> {
        Ok(self
            .read_identity(&key.identity)?
            .trees
            .remove(key.tree_id()))
    }

    fn replace_tree(&self, key: &TreeKey, state: &TreeState) -> Result<()> {
        self.update(&key.identity, |file| {
            file.trees.insert(key.tree_id().to_string(), state.clone());
        })
    }

    fn list_trees(&self, identity: &str) -> Result<Vec<TreeState>> {
        // BTreeMap keeps tree ids sorted
        Ok(self.read_identity(identity)?.trees.into_values().collect())
    }

    fn archive_leaf(&self, identity: &str, leaf: &ArchivedLeaf) -> Result<()> {
        self.update(identity, |file| file.messages.push(leaf.clone()))
    }

    fn find_leaf(&self, identity: &str, content_hash: &Hash) -> Result<Option<ArchivedLeaf>> {
        Ok(self.read_identity(identity)?.find_leaf(content_hash).cloned())
    }

    fn commit(&self, key: &TreeKey, state: &TreeState, leaf: &ArchivedLeaf) -> Result<()> {
        self.update(&key.identity, |file| {
            file.trees.insert(key.tree_id().to_string(), state.clone());
            file.messages.push(leaf.clone());
        })
    }
}

/// Identities that are safe file names are used as-is, anything else is
/// hex-encoded
fn file_stem(identity: &str) -> String {
    let safe = !identity.is_empty()
        && identity.len() <= 128
        && !identity.starts_with('.')
        && identity
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if safe {
        identity.to_string()
    } else {
        format!("x-{}", hex::encode(identity.as_bytes()))
    }
}
