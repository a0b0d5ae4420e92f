//! Runtime configuration
//!
//! Resolution order, later wins: built-in defaults, the JSON file at
//! `<config dir>/notary/config.json`, `NOTARY_*` environment variables, and
//! finally whatever the caller (usually the CLI) sets explicitly.

use crate::anchor::VectorCommitMode;
use crate::store::StoreFormat;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "NOTARY_DATA_DIR";
pub const ENV_STORE_FORMAT: &str = "NOTARY_STORE_FORMAT";
pub const ENV_INSECURE_DEMO_TAG: &str = "NOTARY_INSECURE_DEMO_TAG";
pub const ENV_VECTOR_COMMIT: &str = "NOTARY_VECTOR_COMMIT";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one store file per identity
    pub data_dir: PathBuf,
    pub store_format: StoreFormat,
    /// Attach the reversible demo tag to receipts. Not confidential.
    pub insecure_demo_tag: bool,
    pub vector_commit: VectorCommitMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            store_format: StoreFormat::default(),
            insecure_demo_tag: false,
            vector_commit: VectorCommitMode::default(),
        }
    }
}

impl Config {
    /// Default location of the config file, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("notary").join("config.json"))
    }

    /// Defaults, then the config file if present, then the environment
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Apply `NOTARY_*` overrides from any variable source
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(format) = lookup(ENV_STORE_FORMAT) {
            self.store_format = format.parse()?;
        }
        if let Some(flag) = lookup(ENV_INSECURE_DEMO_TAG) {
            self.insecure_demo_tag = parse_flag(ENV_INSECURE_DEMO_TAG, &flag)?;
        }
        if let Some(mode) = lookup(ENV_VECTOR_COMMIT) {
            self.vector_commit = mode.parse()?;
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(format!("{} must be a boolean, got {}", name, other))),
    }
}
