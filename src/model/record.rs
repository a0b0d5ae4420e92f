//! Records - the unit that gets notarized

use super::WindowKey;
use crate::{Error, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Random bytes per nonce (rendered as 10 hex chars)
pub const NONCE_LEN: usize = 5;

/// What a caller submits for notarization
///
/// `content` is optional here only so that a missing field can be reported
/// as malformed; an explicit JSON `null` is accepted and hashed as `null`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecordInput {
    #[serde(rename = "user_id", alias = "identity")]
    pub identity: String,
    /// Unix seconds
    pub created: u64,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Value>,
    #[serde(default = "default_fingerprint")]
    pub system_fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Distinguishes `"content": null` from a missing field
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn default_fingerprint() -> String {
    "none".to_string()
}

impl RecordInput {
    /// Start a record for an identity at a timestamp
    pub fn new(identity: impl Into<String>, created: u64, content: impl Into<Value>) -> Self {
        RecordInput {
            identity: identity.into(),
            created,
            provider: String::new(),
            model: String::new(),
            content: Some(content.into()),
            system_fingerprint: default_fingerprint(),
            content_type: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.provider = provider.into();
        self.model = model.into();
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.system_fingerprint = fingerprint.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Validate and seal with a fresh random nonce
    pub fn seal(self) -> Result<Record> {
        let mut bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        self.seal_with_nonce(hex::encode(bytes))
    }

    /// Validate and seal with a caller-chosen nonce
    pub fn seal_with_nonce(self, nonce: impl Into<String>) -> Result<Record> {
        if self.identity.trim().is_empty() {
            return Err(Error::MalformedRecord("identity is empty".into()));
        }
        let content = self
            .content
            .ok_or_else(|| Error::MalformedRecord("content is missing".into()))?;
        WindowKey::utc_day(self.created)?;

        Ok(Record {
            identity: self.identity,
            created: self.created,
            provider: self.provider,
            model: self.model,
            content,
            system_fingerprint: self.system_fingerprint,
            content_type: self.content_type,
            nonce: nonce.into(),
        })
    }
}

/// A validated record with its nonce, ready to hash
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "user_id")]
    pub identity: String,
    pub created: u64,
    pub provider: String,
    pub model: String,
    pub content: Value,
    pub system_fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub nonce: String,
}

impl Record {
    /// The window (and so the tree) this record belongs to
    pub fn window(&self) -> Result<WindowKey> {
        WindowKey::utc_day(self.created)
    }

    /// The object that gets canonicalized and hashed
    ///
    /// `content_type` is left out entirely when absent.
    pub fn payload(&self) -> Value {
        let mut map = Map::new();
        map.insert("user_id".into(), Value::String(self.identity.clone()));
        map.insert("created".into(), Value::from(self.created));
        map.insert("provider".into(), Value::String(self.provider.clone()));
        map.insert("model".into(), Value::String(self.model.clone()));
        map.insert("content".into(), self.content.clone());
        map.insert(
            "system_fingerprint".into(),
            Value::String(self.system_fingerprint.clone()),
        );
        map.insert("nonce".into(), Value::String(self.nonce.clone()));
        if let Some(ct) = &self.content_type {
            map.insert("content_type".into(), Value::String(ct.clone()));
        }
        Value::Object(map)
    }

    /// Payload without the nonce, for comparing logical content
    pub fn payload_without_nonce(&self) -> Value {
        let mut payload = self.payload();
        if let Value::Object(map) = &mut payload {
            map.remove("nonce");
        }
        payload
    }
}
