//! update
//!
//! Release checks and binary self-update.
//!
//! # Design
//!
//! Before most commands, a release check starts on a background task and
//! is joined after the command finishes, so the check never delays the
//! command itself. Checks are rate limited through the system config's
//! `last_update_checked_at` timestamp and skipped entirely in CI, under
//! `SLACK_SKIP_UPDATE`, when a raw `--token` is in use, and for commands
//! that must stay quiet such as `version`.

pub mod archive;
pub mod metadata;
pub mod semver;
pub mod upgrade;

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;

use crate::config::SystemConfigStore;
use crate::ui::IoStreams;

pub use metadata::{MetadataClient, Release, METADATA_URL};
pub use upgrade::Upgrader;

/// Environment variable that disables update checks when set.
pub const SKIP_UPDATE_ENV: &str = "SLACK_SKIP_UPDATE";

/// Hours to wait between release checks.
const HOURS_BETWEEN_CHECKS: i64 = 24;

/// Commands that never trigger a release check.
const IGNORED_COMMANDS: &[&str] = &["version", "upgrade"];

/// Decides whether to check for a release and runs the check.
pub struct UpdateChecker {
    current_version: String,
    metadata_url: String,
    enabled: bool,
}

impl UpdateChecker {
    /// `enabled` is false when the invocation opted out, e.g. with
    /// `--skip-update` or by passing a raw `--token`.
    pub fn new(current_version: &str, enabled: bool) -> Self {
        Self {
            current_version: current_version.to_string(),
            metadata_url: METADATA_URL.to_string(),
            enabled,
        }
    }

    #[cfg(test)]
    fn with_metadata_url(mut self, url: &str) -> Self {
        self.metadata_url = url.to_string();
        self
    }

    /// Start the release check on a background task.
    ///
    /// Returns a handle the command loop joins after the command body has
    /// run; a skipped check yields a handle that resolves immediately.
    pub fn start(
        self,
        command: &str,
        config: Arc<SystemConfigStore>,
        io: IoStreams,
        force: bool,
    ) -> UpdateCheck {
        if !self.should_check(command, &config, force) {
            return UpdateCheck { handle: None };
        }
        let handle = tokio::spawn(async move { self.check(&config, io).await });
        UpdateCheck {
            handle: Some(handle),
        }
    }

    async fn check(&self, config: &SystemConfigStore, io: IoStreams) -> Option<Release> {
        let client = MetadataClient::new(&self.metadata_url);
        let release = match client.check_for_update(&self.current_version).await {
            Ok(release) => release,
            Err(err) => {
                io.debug(format!("release check failed: {}", err));
                None
            }
        };
        if let Err(err) = config.set_last_update_checked_at(Utc::now()) {
            io.debug(format!("failed to record update check time: {}", err));
        }
        release
    }

    fn should_check(&self, command: &str, config: &SystemConfigStore, force: bool) -> bool {
        if force {
            return true;
        }
        if !self.enabled || skip_requested() || in_ci() || is_ignored_command(command) {
            return false;
        }
        check_is_due(config)
    }
}

/// Handle to a background release check.
pub struct UpdateCheck {
    handle: Option<JoinHandle<Option<Release>>>,
}

impl UpdateCheck {
    /// A check that was skipped.
    pub fn skipped() -> Self {
        Self { handle: None }
    }

    /// Wait for the check and return an available release, if any.
    pub async fn finish(self) -> Option<Release> {
        match self.handle {
            Some(handle) => handle.await.ok().flatten(),
            None => None,
        }
    }
}

/// Ask the project's SDK about its own updates via the `check-update`
/// hook. Returns the hook's response, or nothing when the working
/// directory is not a project or the hook is not configured.
pub fn check_sdk_update(io: IoStreams, working_dir: &std::path::Path) -> Option<String> {
    use crate::config::project::find_project_root;
    use crate::hooks::{executor_for, HookExecOpts, SdkConfig};

    let root = find_project_root(working_dir)?;
    let config = SdkConfig::load(&root).ok()?;
    if !config.hooks.check_update.is_available() {
        io.debug("no check-update hook is configured");
        return None;
    }
    let executor = executor_for(io, &config);
    let opts = HookExecOpts {
        hook: config.hooks.check_update.clone(),
        directory: Some(root),
        ..Default::default()
    };
    match executor.execute(&opts) {
        Ok(response) if !response.is_empty() => Some(response),
        Ok(_) => None,
        Err(err) => {
            io.debug(format!("check-update hook failed: {}", err));
            None
        }
    }
}

fn skip_requested() -> bool {
    std::env::var(SKIP_UPDATE_ENV).map_or(false, |v| !v.is_empty())
}

/// Detection lifted from the common CI providers: CI (GitHub Actions,
/// Travis, CircleCI, GitLab), BUILD_NUMBER (Jenkins, TeamCity), and
/// RUN_ID (TaskCluster).
fn in_ci() -> bool {
    ["CI", "BUILD_NUMBER", "RUN_ID"]
        .iter()
        .any(|var| std::env::var(var).map_or(false, |v| !v.is_empty()))
}

fn is_ignored_command(command: &str) -> bool {
    IGNORED_COMMANDS.contains(&command)
}

/// True when more than the wait interval has passed since the last check.
///
/// A missing timestamp counts as due, so fresh installs check right away.
fn check_is_due(config: &SystemConfigStore) -> bool {
    match config.last_update_checked_at() {
        // Duration comparison, so a check 24h30m after the last one is due
        // instead of being rounded down to a whole day.
        Ok(Some(last)) => {
            Utc::now().signed_duration_since(last) > Duration::hours(HOURS_BETWEEN_CHECKS)
        }
        Ok(None) => true,
        Err(_) => false,
    }
}
