//! config::project
//!
//! Per-project configuration under `.slack/` in the project root.
//!
//! # Design
//!
//! A directory is a project when it contains `.slack/hooks.json`, or the
//! legacy `slack.json` at its root. The project root is found by walking
//! up from the working directory, so commands work from any subdirectory.
//!
//! `.slack/config.json` carries a per-project ID, the manifest source, and
//! project-scoped survey state, with the same write discipline as the
//! system config: mutex-guarded read-modify-write, trailing newline.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::system::SurveyConfig;
use crate::error::{codes, Error, Result};

/// Project metadata directory name.
pub const PROJECT_DIR: &str = ".slack";

const HOOKS_FILE: &str = "hooks.json";
const CONFIG_FILE: &str = "config.json";
const LEGACY_HOOKS_FILE: &str = "slack.json";

/// Where the app manifest is authored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestSource {
    /// The manifest lives in project source, surfaced by a hook.
    #[default]
    Local,
    /// The manifest of record is the installed app on the platform.
    Remote,
}

impl std::fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestSource::Local => write!(f, "local"),
            ManifestSource::Remote => write!(f, "remote"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ManifestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

/// Shape of `.slack/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    manifest: Option<ManifestConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    surveys: BTreeMap<String, SurveyConfig>,
}

/// Find the nearest ancestor of `start` that is a project root.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        if current.join(PROJECT_DIR).join(HOOKS_FILE).is_file()
            || current.join(LEGACY_HOOKS_FILE).is_file()
        {
            return Some(current.to_path_buf());
        }
        dir = current.parent();
    }
    None
}

/// Store for a project's `.slack/config.json`.
#[derive(Debug)]
pub struct ProjectConfigStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl ProjectConfigStore {
    /// Open the store for the project containing `working_dir`.
    pub fn for_working_dir(working_dir: &Path) -> Result<Self> {
        let root = find_project_root(working_dir).ok_or_else(|| {
            Error::new(codes::INVALID_APP_DIRECTORY).with_message(format!(
                "No project found in {} or any parent directory",
                working_dir.display()
            ))
        })?;
        Ok(Self::new(&root))
    }

    /// Open the store for a known project root.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the project's hooks file.
    pub fn hooks_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join(HOOKS_FILE)
    }

    fn config_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join(CONFIG_FILE)
    }

    /// The project ID, created and saved on first access.
    pub fn project_id(&self) -> Result<String> {
        let _guard = self.lock.lock().map_err(|_| lock_poisoned())?;
        let mut config = self.read()?;
        if let Some(ref id) = config.project_id {
            return Ok(id.clone());
        }
        let id = Uuid::new_v4().to_string();
        config.project_id = Some(id.clone());
        self.write(&config)?;
        Ok(id)
    }

    /// The configured manifest source, defaulting to local.
    ///
    /// A value other than `local` or `remote` is a configuration error.
    pub fn manifest_source(&self) -> Result<ManifestSource> {
        let config = self.read()?;
        let source = match config.manifest.and_then(|m| m.source) {
            None => return Ok(ManifestSource::default()),
            Some(source) => source,
        };
        match source.as_str() {
            "local" => Ok(ManifestSource::Local),
            "remote" => Ok(ManifestSource::Remote),
            other => Err(Error::new(codes::PROJECT_CONFIG_MANIFEST_SOURCE)
                .with_message(format!(
                    "Unsupported manifest source \"{}\" in {}",
                    other,
                    self.config_path().display()
                ))
                .with_remediation("Set \"manifest.source\" to \"local\" or \"remote\"")),
        }
    }

    pub fn set_manifest_source(&self, source: ManifestSource) -> Result<()> {
        self.update(|config| {
            config.manifest = Some(ManifestConfig {
                source: Some(source.to_string()),
            });
        })
    }

    /// Project-scoped survey bookkeeping.
    pub fn survey_config(&self, name: &str) -> Result<SurveyConfig> {
        self.read()?.surveys.get(name).cloned().ok_or_else(|| {
            Error::new(codes::SURVEY_CONFIG_NOT_FOUND)
                .with_message(format!("No survey config found for \"{}\"", name))
        })
    }

    pub fn set_survey_config(&self, name: &str, survey: SurveyConfig) -> Result<()> {
        self.update(|config| {
            config.surveys.insert(name.to_string(), survey);
        })
    }

    fn update(&self, apply: impl FnOnce(&mut ProjectConfig)) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| lock_poisoned())?;
        let mut config = self.read()?;
        apply(&mut config);
        self.write(&config)
    }

    fn read(&self) -> Result<ProjectConfig> {
        let path = self.config_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ProjectConfig::default());
            }
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            return Ok(ProjectConfig::default());
        }
        serde_json::from_str(&contents).map_err(|err| {
            Error::new(codes::UNABLE_TO_PARSE_JSON)
                .with_message(format!("Failed to parse {}", path.display()))
                .with_source(err)
        })
    }

    fn write(&self, config: &ProjectConfig) -> Result<()> {
        let path = self.config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut contents = serde_json::to_string_pretty(config)?;
        contents.push('\n');
        fs::write(&path, contents)?;
        Ok(())
    }
}

fn lock_poisoned() -> Error {
    Error::new("config_lock_poisoned").with_message("Config lock poisoned by an earlier panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_project(dir: &Path) {
        fs::create_dir_all(dir.join(PROJECT_DIR)).unwrap();
        fs::write(dir.join(PROJECT_DIR).join(HOOKS_FILE), "{}").unwrap();
    }

    mod root_detection {
        use super::*;

        #[test]
        fn finds_root_from_a_nested_directory() {
            let dir = TempDir::new().unwrap();
            make_project(dir.path());
            let nested = dir.path().join("src/listeners");
            fs::create_dir_all(&nested).unwrap();
            assert_eq!(find_project_root(&nested).unwrap(), dir.path());
        }

        #[test]
        fn legacy_slack_json_marks_a_root() {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join(LEGACY_HOOKS_FILE), "{}").unwrap();
            assert_eq!(find_project_root(dir.path()).unwrap(), dir.path());
        }

        #[test]
        fn plain_directories_are_not_projects() {
            let dir = TempDir::new().unwrap();
            assert!(find_project_root(dir.path()).is_none());
        }

        #[test]
        fn outside_a_project_opening_the_store_fails() {
            let dir = TempDir::new().unwrap();
            let err = ProjectConfigStore::for_working_dir(dir.path()).unwrap_err();
            assert_eq!(err.code(), codes::INVALID_APP_DIRECTORY);
        }
    }

    #[test]
    fn project_id_is_created_once() {
        let dir = TempDir::new().unwrap();
        make_project(dir.path());
        let store = ProjectConfigStore::new(dir.path());
        let first = store.project_id().unwrap();
        assert_eq!(store.project_id().unwrap(), first);
    }

    mod manifest_source {
        use super::*;

        #[test]
        fn defaults_to_local() {
            let dir = TempDir::new().unwrap();
            make_project(dir.path());
            let store = ProjectConfigStore::new(dir.path());
            assert_eq!(store.manifest_source().unwrap(), ManifestSource::Local);
        }

        #[test]
        fn round_trips_remote() {
            let dir = TempDir::new().unwrap();
            make_project(dir.path());
            let store = ProjectConfigStore::new(dir.path());
            store.set_manifest_source(ManifestSource::Remote).unwrap();
            assert_eq!(store.manifest_source().unwrap(), ManifestSource::Remote);
        }

        #[test]
        fn rejects_unknown_values() {
            let dir = TempDir::new().unwrap();
            make_project(dir.path());
            fs::write(
                dir.path().join(PROJECT_DIR).join(CONFIG_FILE),
                r#"{"manifest":{"source":"upstream"}}"#,
            )
            .unwrap();
            let store = ProjectConfigStore::new(dir.path());
            let err = store.manifest_source().unwrap_err();
            assert_eq!(err.code(), codes::PROJECT_CONFIG_MANIFEST_SOURCE);
        }
    }

    #[test]
    fn writes_preserve_other_fields() {
        let dir = TempDir::new().unwrap();
        make_project(dir.path());
        let store = ProjectConfigStore::new(dir.path());
        let id = store.project_id().unwrap();
        store.set_manifest_source(ManifestSource::Remote).unwrap();
        assert_eq!(store.project_id().unwrap(), id);
    }
}
