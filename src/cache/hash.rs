//! cache::hash
//!
//! Canonical hashing of JSON documents.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// SHA-256 hex digest of a canonicalized JSON document.
///
/// Canonicalization parses the document and re-serializes it with object
/// keys sorted and no insignificant whitespace, so two documents that
/// differ only in key order or formatting hash the same. Input that is
/// not JSON is hashed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash(String);

impl Hash {
    /// Hash a document, canonicalizing it first when it parses as JSON.
    pub fn of(document: &[u8]) -> Self {
        match serde_json::from_slice::<serde_json::Value>(document) {
            Ok(value) => Self::of_value(&value),
            Err(_) => Self(hex::encode(Sha256::digest(document))),
        }
    }

    /// Hash an already parsed JSON value.
    pub fn of_value(value: &serde_json::Value) -> Self {
        // serde_json::Value stores objects as a BTreeMap, so serializing
        // sorts keys at every level.
        let canonical = value.to_string();
        Self(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    /// Hash a JSON document, rejecting input that does not parse.
    pub fn of_json(document: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(document)?;
        Ok(Self::of_value(&value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
