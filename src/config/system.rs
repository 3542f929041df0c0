//! config::system
//!
//! Per-user configuration under the config directory.
//!
//! # Design
//!
//! `config.json` holds small bits of cross-project state: an anonymous
//! system ID, the timestamp of the last update check, survey bookkeeping,
//! and enabled experiments. Writes go through a single mutex-guarded
//! read-modify-write so concurrent commands in one process never clobber
//! each other's fields. Files are written with a trailing newline and
//! owner-only permissions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{codes, Error, Result};

const CONFIG_FILE: &str = "config.json";
const CREDENTIALS_FILE: &str = "credentials.json";
const LOGS_DIR: &str = "logs";

/// Environment variable overriding the config directory location.
pub const CONFIG_DIR_ENV: &str = "SLACK_CONFIG_DIR";

/// Default config directory name under the home directory.
const DEFAULT_DIR_NAME: &str = ".slack";

/// Resolve the config directory: flag, then environment, then `~/.slack`.
pub fn resolve_config_dir(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = dirs::home_dir().ok_or_else(|| {
        Error::new(codes::HOME_DIRECTORY_ACCESS_FAILED)
            .with_message("Failed to locate your home directory")
    })?;
    Ok(home.join(DEFAULT_DIR_NAME))
}

/// Survey bookkeeping saved per survey name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SurveyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Shape of `config.json`. Unknown fields are preserved by serde only if
/// listed here, so this struct carries everything the file may hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SystemConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    system_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_update_checked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    trust_unknown_sources: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    surveys: BTreeMap<String, SurveyConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    experiments: Vec<String>,
}

/// Store for the per-user `config.json`.
pub struct SystemConfigStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl SystemConfigStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// The config directory this store is rooted at.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the backing config file.
    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Directory where command logs are written.
    pub fn logs_dir(&self) -> PathBuf {
        self.dir.join(LOGS_DIR)
    }

    /// Create the config directory, empty config and credentials files,
    /// and the logs directory if any are missing.
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::create_dir_all(self.logs_dir())?;
        for path in [self.config_path(), self.dir.join(CREDENTIALS_FILE)] {
            if !path.exists() {
                self.write_raw(&path, "{}\n")?;
            }
        }
        Ok(())
    }

    /// The anonymous system ID, created and saved on first access.
    pub fn system_id(&self) -> Result<String> {
        let _guard = self.lock.lock().map_err(|_| lock_poisoned())?;
        let mut config = self.read()?;
        if let Some(ref id) = config.system_id {
            return Ok(id.clone());
        }
        let id = Uuid::new_v4().to_string();
        config.system_id = Some(id.clone());
        self.write(&config)?;
        Ok(id)
    }

    /// When the last update check ran, if ever.
    pub fn last_update_checked_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read_locked()?.last_update_checked_at)
    }

    /// Record the time of an update check.
    pub fn set_last_update_checked_at(&self, at: DateTime<Utc>) -> Result<()> {
        self.update(|config| config.last_update_checked_at = Some(at))
    }

    /// Whether apps from unknown authors may be installed without a prompt.
    pub fn trust_unknown_sources(&self) -> Result<bool> {
        Ok(self.read_locked()?.trust_unknown_sources)
    }

    pub fn set_trust_unknown_sources(&self, trust: bool) -> Result<()> {
        self.update(|config| config.trust_unknown_sources = trust)
    }

    /// Survey bookkeeping for a named survey.
    pub fn survey_config(&self, name: &str) -> Result<SurveyConfig> {
        self.read_locked()?.surveys.get(name).cloned().ok_or_else(|| {
            Error::new(codes::SURVEY_CONFIG_NOT_FOUND)
                .with_message(format!("No survey config found for \"{}\"", name))
        })
    }

    pub fn set_survey_config(&self, name: &str, survey: SurveyConfig) -> Result<()> {
        self.update(|config| {
            config.surveys.insert(name.to_string(), survey);
        })
    }

    /// Experiments enabled in the config file, merged with any passed on
    /// the command line. Duplicates are dropped, order is preserved.
    pub fn enabled_experiments(&self, flag_experiments: &[String]) -> Result<Vec<String>> {
        let mut experiments = self.read_locked()?.experiments;
        for experiment in flag_experiments {
            if !experiments.contains(experiment) {
                experiments.push(experiment.clone());
            }
        }
        Ok(experiments)
    }

    /// Lock, read, apply, write back.
    fn update(&self, apply: impl FnOnce(&mut SystemConfig)) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| lock_poisoned())?;
        let mut config = self.read()?;
        apply(&mut config);
        self.write(&config)
    }

    /// Read under the lock. Accessors use this so a read never observes a
    /// write in progress; `update` and `system_id` already hold the lock
    /// and call `read` directly.
    fn read_locked(&self) -> Result<SystemConfig> {
        let _guard = self.lock.lock().map_err(|_| lock_poisoned())?;
        self.read()
    }

    /// Decode the config file, treating a missing file as empty defaults.
    fn read(&self) -> Result<SystemConfig> {
        let path = self.config_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SystemConfig::default());
            }
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            return Ok(SystemConfig::default());
        }
        serde_json::from_str(&contents).map_err(|err| {
            Error::new(codes::UNABLE_TO_PARSE_JSON)
                .with_message(format!("Failed to parse {}", path.display()))
                .with_source(err)
        })
    }

    fn write(&self, config: &SystemConfig) -> Result<()> {
        let mut contents = serde_json::to_string_pretty(config)?;
        contents.push('\n');
        self.write_raw(&self.config_path(), &contents)
    }

    fn write_raw(&self, path: &Path, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(path, contents)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
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

    fn store_in(dir: &TempDir) -> SystemConfigStore {
        SystemConfigStore::new(dir.path())
    }

    #[test]
    fn initialize_creates_empty_config_and_logs_dir() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().unwrap();
        assert_eq!(
            fs::read_to_string(store.config_path()).unwrap(),
            "{}\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join(CREDENTIALS_FILE)).unwrap(),
            "{}\n"
        );
        assert!(store.logs_dir().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn initialized_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().unwrap();
        for path in [store.config_path(), dir.path().join(CREDENTIALS_FILE)] {
            let mode = fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn initialize_leaves_existing_files_alone() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_trust_unknown_sources(true).unwrap();
        store.initialize().unwrap();
        assert!(store.trust_unknown_sources().unwrap());
    }

    #[test]
    fn reads_during_concurrent_writes_stay_consistent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_last_update_checked_at(Utc::now()).unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..50 {
                    store.set_last_update_checked_at(Utc::now()).unwrap();
                }
            });
            for _ in 0..50 {
                assert!(store.last_update_checked_at().unwrap().is_some());
            }
        });
    }

    #[test]
    fn system_id_is_created_once_and_persisted() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let first = store.system_id().unwrap();
        let second = store.system_id().unwrap();
        assert_eq!(first, second);
        assert!(fs::read_to_string(store.config_path())
            .unwrap()
            .contains(&first));
    }

    #[test]
    fn update_check_timestamp_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.last_update_checked_at().unwrap().is_none());

        let now = Utc::now();
        store.set_last_update_checked_at(now).unwrap();
        let saved = store.last_update_checked_at().unwrap().unwrap();
        assert_eq!(saved.timestamp(), now.timestamp());
    }

    #[test]
    fn updates_preserve_unrelated_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let id = store.system_id().unwrap();
        store.set_trust_unknown_sources(true).unwrap();
        store.set_last_update_checked_at(Utc::now()).unwrap();

        assert_eq!(store.system_id().unwrap(), id);
        assert!(store.trust_unknown_sources().unwrap());
    }

    #[test]
    fn written_file_ends_with_a_newline() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_trust_unknown_sources(true).unwrap();
        assert!(fs::read_to_string(store.config_path())
            .unwrap()
            .ends_with('\n'));
    }

    #[test]
    fn missing_survey_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let err = store.survey_config("platform-survey").unwrap_err();
        assert_eq!(err.code(), codes::SURVEY_CONFIG_NOT_FOUND);
    }

    #[test]
    fn survey_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let survey = SurveyConfig {
            asked_at: Some(Utc::now()),
            completed_at: None,
        };
        store.set_survey_config("platform-survey", survey.clone()).unwrap();
        assert_eq!(store.survey_config("platform-survey").unwrap(), survey);
    }

    #[test]
    fn flag_experiments_merge_without_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(
            store.config_path(),
            r#"{"experiments":["bolt","deno2"]}"#,
        )
        .unwrap();

        let merged = store
            .enabled_experiments(&["deno2".to_string(), "hermes".to_string()])
            .unwrap();
        assert_eq!(merged, vec!["bolt", "deno2", "hermes"]);
    }

    mod dir_resolution {
        use super::*;

        #[test]
        fn flag_wins_over_everything() {
            let dir = resolve_config_dir(Some(Path::new("/tmp/custom"))).unwrap();
            assert_eq!(dir, PathBuf::from("/tmp/custom"));
        }

        #[test]
        fn default_is_dot_slack_under_home() {
            // Scoped to processes without SLACK_CONFIG_DIR set.
            if std::env::var(CONFIG_DIR_ENV).is_ok() {
                return;
            }
            let dir = resolve_config_dir(None).unwrap();
            assert!(dir.ends_with(".slack"));
        }
    }
}
