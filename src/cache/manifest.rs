//! cache::manifest
//!
//! Per-app manifest hashes cached under `.slack/cache/manifests.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::hash::Hash;
use crate::config::project::PROJECT_DIR;
use crate::error::{codes, Error, Result};

const CACHE_DIR: &str = "cache";
const MANIFESTS_FILE: &str = "manifests.json";

/// Cached state for one app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ManifestEntry {
    hash: Hash,
}

/// Cache of the last manifest hash seen per app ID.
///
/// A missing cache file is an empty cache; the file and its directory are
/// created on first write.
pub struct ManifestCache {
    path: PathBuf,
}

impl ManifestCache {
    /// Open the cache for a project root.
    pub fn new(project_root: &Path) -> Self {
        Self {
            path: project_root
                .join(PROJECT_DIR)
                .join(CACHE_DIR)
                .join(MANIFESTS_FILE),
        }
    }

    /// The cached hash for an app, if one was recorded.
    pub fn manifest_hash(&self, app_id: &str) -> Result<Option<Hash>> {
        Ok(self.read()?.remove(app_id).map(|entry| entry.hash))
    }

    /// Record the hash of the manifest most recently applied for an app.
    pub fn set_manifest_hash(&self, app_id: &str, hash: Hash) -> Result<()> {
        let mut entries = self.read()?;
        entries.insert(app_id.to_string(), ManifestEntry { hash });
        self.write(&entries)
    }

    /// Hash a manifest with the same canonicalization the cache uses,
    /// so comparisons against cached hashes are apples to apples.
    pub fn manifest_hash_of(manifest: &serde_json::Value) -> Hash {
        Hash::of_value(manifest)
    }

    /// Drop the cached entry for an app, e.g. after it is deleted.
    pub fn remove(&self, app_id: &str) -> Result<()> {
        let mut entries = self.read()?;
        if entries.remove(app_id).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }

    fn read(&self) -> Result<BTreeMap<String, ManifestEntry>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|err| {
            Error::new(codes::UNABLE_TO_PARSE_JSON)
                .with_message(format!("Failed to parse {}", self.path.display()))
                .with_source(err)
        })
    }

    fn write(&self, entries: &BTreeMap<String, ManifestEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut contents = serde_json::to_string_pretty(entries)?;
        contents.push('\n');
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
