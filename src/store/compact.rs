//! Compact binary identity files
//!
//! File format:
//! ```text
//! [HEADER: 44 bytes]
//!   - magic: 8 bytes ("NOTARYDB")
//!   - version: 4 bytes (u32 LE)
//!   - checksum: 32 bytes (SHA-256 of the compressed body)
//!
//! [BODY: variable]
//!   - zstd-compressed bincode of the identity file, with application
//!     fields carried as one JSON text
//! ```

use super::{ArchivedLeaf, IdentityFile};
use crate::merkle::TreeState;
use crate::model::Hash;
use crate::{Error, Result, MAGIC, VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const HEADER_SIZE: usize = 8 + 4 + 32;
const ZSTD_LEVEL: i32 = 3;

/// Bincode layout of an identity file
#[derive(Serialize)]
struct BodyRef<'a> {
    trees: &'a BTreeMap<String, TreeState>,
    messages: &'a [ArchivedLeaf],
    extra: String,
}

#[derive(Deserialize)]
struct Body {
    trees: BTreeMap<String, TreeState>,
    messages: Vec<ArchivedLeaf>,
    extra: String,
}

/// Serialize, compress and frame an identity file
pub fn encode_compact(file: &IdentityFile) -> Result<Vec<u8>> {
    let raw = bincode::serialize(&BodyRef {
        trees: &file.trees,
        messages: &file.messages,
        extra: serde_json::to_string(&file.extra)?,
    })?;
    let body = zstd::encode_all(raw.as_slice(), ZSTD_LEVEL)?;

    let mut output = Vec::with_capacity(HEADER_SIZE + body.len());
    output.extend_from_slice(MAGIC);
    output.extend_from_slice(&VERSION.to_le_bytes());
    output.extend_from_slice(Hash::digest(&body).as_bytes());
    output.extend(body);
    Ok(output)
}

/// Validate the frame and decode an identity file
pub fn decode_compact(data: &[u8]) -> Result<IdentityFile> {
    if data.len() < HEADER_SIZE {
        return Err(Error::InvalidFile(format!(
            "truncated header: {} bytes",
            data.len()
        )));
    }
    if &data[0..8] != MAGIC {
        return Err(Error::InvalidFile("Invalid magic bytes".into()));
    }

    let mut version_bytes = [0u8; 4];
    version_bytes.copy_from_slice(&data[8..12]);
    let version = u32::from_le_bytes(version_bytes);
    if version != VERSION {
        return Err(Error::VersionMismatch {
            expected: VERSION,
            found: version,
        });
    }

    let mut checksum = [0u8; 32];
    checksum.copy_from_slice(&data[12..HEADER_SIZE]);
    let body = &data[HEADER_SIZE..];
    if Hash::digest(body) != Hash::from_bytes(checksum) {
        return Err(Error::Corruption("identity file checksum mismatch".into()));
    }

    let raw = zstd::decode_all(body)?;
    let body: Body = bincode::deserialize(&raw)?;
    let file = IdentityFile {
        trees: body.trees,
        messages: body.messages,
        extra: serde_json::from_str(&body.extra)?,
    };
    Ok(file.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::MerkleTree;

    fn sample() -> IdentityFile {
        let leaves = (0..5u8).map(|i| Hash::digest(&[i])).collect();
        let tree = MerkleTree::from_leaves("2024-02-02", leaves);
        let mut file = IdentityFile::default();
        file.trees.insert("2024-02-02".into(), tree.to_state());
        file
    }

    #[test]
    fn test_compact_roundtrip() {
        let file = sample();
        let bytes = encode_compact(&file).unwrap();
        assert_eq!(&bytes[0..8], MAGIC);
        assert_eq!(decode_compact(&bytes).unwrap(), file);
    }

    #[test]
    fn test_application_fields_survive() {
        let mut file = sample();
        file.extra
            .insert("chats".into(), serde_json::json!([{"role": "user", "content": "hi"}]));
        file.extra.insert("logs".into(), serde_json::json!([]));
        let back = decode_compact(&encode_compact(&file).unwrap()).unwrap();
        assert_eq!(back.extra, file.extra);
    }

    #[test]
    fn test_flipped_body_byte_is_corruption() {
        let mut bytes = encode_compact(&sample()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(decode_compact(&bytes), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut bytes = encode_compact(&sample()).unwrap();
        bytes[8] = 99;
        assert!(matches!(
            decode_compact(&bytes),
            Err(Error::VersionMismatch { found: 99, .. })
        ));
        bytes[0] = b'X';
        assert!(matches!(decode_compact(&bytes), Err(Error::InvalidFile(_))));
        assert!(decode_compact(b"short").is_err());
    }
}
