//! Time windows and tree keys
//!
//! Every identity gets one tree per UTC calendar day. The window key doubles
//! as the tree id (`YYYY-MM-DD`).

use crate::{Error, Result};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// UTC calendar day bucket, rendered as `YYYY-MM-DD`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowKey(String);

impl WindowKey {
    /// Window containing the given unix timestamp (seconds)
    pub fn utc_day(created: u64) -> Result<Self> {
        let secs = i64::try_from(created)
            .map_err(|_| Error::MalformedRecord(format!("created out of range: {}", created)))?;
        let when = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| Error::MalformedRecord(format!("created out of range: {}", created)))?;
        Ok(WindowKey(when.format("%Y-%m-%d").to_string()))
    }

    /// Wrap an existing tree id (e.g. one read back from storage)
    pub fn from_tree_id(tree_id: impl Into<String>) -> Self {
        WindowKey(tree_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Addresses exactly one tree: an identity and one of its windows
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeKey {
    pub identity: String,
    pub window: WindowKey,
}

impl TreeKey {
    pub fn new(identity: impl Into<String>, window: WindowKey) -> Self {
        TreeKey {
            identity: identity.into(),
            window,
        }
    }

    /// The tree id shown to users and anchored on-chain
    pub fn tree_id(&self) -> &str {
        self.window.as_str()
    }
}

impl fmt::Display for TreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.identity, self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_is_1970_01_01() {
        assert_eq!(WindowKey::utc_day(0).unwrap().as_str(), "1970-01-01");
    }

    #[test]
    fn test_day_boundary() {
        // 2024-03-09T23:59:59Z and 2024-03-10T00:00:00Z
        let before = WindowKey::utc_day(1_710_028_799).unwrap();
        let after = WindowKey::utc_day(1_710_028_800).unwrap();
        assert_eq!(before.as_str(), "2024-03-09");
        assert_eq!(after.as_str(), "2024-03-10");
        assert_ne!(before, after);
    }

    #[test]
    fn test_out_of_range_is_malformed() {
        assert!(matches!(
            WindowKey::utc_day(u64::MAX),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_tree_key_display() {
        let key = TreeKey::new("alice", WindowKey::from_tree_id("2024-01-01"));
        assert_eq!(key.to_string(), "alice/2024-01-01");
        assert_eq!(key.tree_id(), "2024-01-01");
    }
}
