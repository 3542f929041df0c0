//! hooks::config
//!
//! Decoding of `.slack/hooks.json`.
//!
//! Each hook is written as a bare JSON string holding the command line to
//! run. A hook that is absent or blank is unavailable, and resolving it
//! reports which hook was missing so the user can add it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::project::PROJECT_DIR;
use crate::error::{codes, Error, Result};

const HOOKS_FILE: &str = "hooks.json";

/// A single hook command from `hooks.json`.
///
/// `name` is not part of the file; it is filled in after decoding so
/// errors can say which hook was missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookScript {
    pub command: String,
    pub name: String,
}

impl HookScript {
    /// True when a non-blank command is configured.
    pub fn is_available(&self) -> bool {
        !self.command.trim().is_empty()
    }

    /// The command to run, or an error naming the missing hook.
    pub fn get(&self) -> Result<&str> {
        if !self.is_available() {
            return Err(Error::new(codes::SDK_HOOK_NOT_FOUND)
                .with_message(format!("The command for \"{}\" was not found", self.name)));
        }
        Ok(&self.command)
    }
}

// Hooks are written as bare strings: `"get-manifest": "npx manifest"`.
impl<'de> Deserialize<'de> for HookScript {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let command = String::deserialize(deserializer)?;
        Ok(HookScript {
            command,
            name: String::new(),
        })
    }
}

/// Hook commands the CLI knows how to call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookMap {
    #[serde(default, rename = "build")]
    pub build_project: HookScript,
    #[serde(default, rename = "check-update")]
    pub check_update: HookScript,
    #[serde(default)]
    pub deploy: HookScript,
    #[serde(default)]
    pub doctor: HookScript,
    #[serde(default, rename = "get-hooks")]
    pub get_hooks: HookScript,
    #[serde(default, rename = "get-manifest")]
    pub get_manifest: HookScript,
    #[serde(default, rename = "get-trigger")]
    pub get_trigger: HookScript,
    #[serde(default, rename = "install-update")]
    pub install_update: HookScript,
    #[serde(default)]
    pub start: HookScript,
}

/// Protocols for exchanging hook responses over stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    /// The whole of stdout, trimmed, is the response.
    #[default]
    Default,
    /// The response is wrapped in a boundary nonce passed to the hook.
    MessageBoundaries,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Default => "default",
            Protocol::MessageBoundaries => "message-boundaries",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Protocol::Default),
            "message-boundaries" => Some(Protocol::MessageBoundaries),
            _ => None,
        }
    }
}

/// Runtime options published by the SDK alongside its hooks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SdkOptions {
    #[serde(default, rename = "sdk-managed-connection-enabled")]
    pub sdk_managed_connection: bool,
    #[serde(default, rename = "trigger-paths")]
    pub trigger_paths: Vec<String>,
    #[serde(default, rename = "protocol-version")]
    pub supported_protocols: Vec<String>,
}

impl SdkOptions {
    /// The first recognized protocol, earlier entries being preferred.
    pub fn preferred_protocol(&self) -> Protocol {
        self.supported_protocols
            .iter()
            .find_map(|p| Protocol::parse(p))
            .unwrap_or_default()
    }
}

/// Decoded `.slack/hooks.json` plus the directory hooks run from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SdkConfig {
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub hooks: HookMap,
    #[serde(default)]
    pub config: SdkOptions,
    #[serde(skip)]
    pub working_directory: PathBuf,
}

impl SdkConfig {
    /// Load the hooks file from a project root.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(PROJECT_DIR).join(HOOKS_FILE);
        let contents = fs::read_to_string(&path).map_err(|err| {
            Error::new(codes::INVALID_APP_DIRECTORY)
                .with_message(format!("Failed to read {}", path.display()))
                .with_source(err)
        })?;
        let mut config: SdkConfig = serde_json::from_str(&contents).map_err(|err| {
            Error::new(codes::UNABLE_TO_PARSE_JSON)
                .with_message(format!("Failed to parse {}", path.display()))
                .with_source(err)
        })?;
        config.working_directory = project_root.to_path_buf();
        config.name_hooks();
        Ok(config)
    }

    // Decoding leaves names blank; fill them in for error messages.
    fn name_hooks(&mut self) {
        let hooks = &mut self.hooks;
        for (script, name) in [
            (&mut hooks.build_project, "build"),
            (&mut hooks.check_update, "check-update"),
            (&mut hooks.deploy, "deploy"),
            (&mut hooks.doctor, "doctor"),
            (&mut hooks.get_hooks, "get-hooks"),
            (&mut hooks.get_manifest, "get-manifest"),
            (&mut hooks.get_trigger, "get-trigger"),
            (&mut hooks.install_update, "install-update"),
            (&mut hooks.start, "start"),
        ] {
            script.name = name.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_hooks(dir: &TempDir, contents: &str) {
        let slack_dir = dir.path().join(PROJECT_DIR);
        fs::create_dir_all(&slack_dir).unwrap();
        fs::write(slack_dir.join(HOOKS_FILE), contents).unwrap();
    }

    #[test]
    fn hooks_decode_from_bare_strings() {
        let dir = TempDir::new().unwrap();
        write_hooks(
            &dir,
            r#"{"hooks":{"get-manifest":"npx slack-cli-get-manifest"}}"#,
        );
        let config = SdkConfig::load(dir.path()).unwrap();
        assert_eq!(
            config.hooks.get_manifest.get().unwrap(),
            "npx slack-cli-get-manifest"
        );
    }

    #[test]
    fn missing_hook_reports_its_name() {
        let dir = TempDir::new().unwrap();
        write_hooks(&dir, r#"{"hooks":{}}"#);
        let config = SdkConfig::load(dir.path()).unwrap();
        let err = config.hooks.deploy.get().unwrap_err();
        assert_eq!(err.code(), codes::SDK_HOOK_NOT_FOUND);
        assert!(err.message().contains("deploy"));
    }

    #[test]
    fn blank_command_is_unavailable() {
        let script = HookScript {
            command: "   ".into(),
            name: "start".into(),
        };
        assert!(!script.is_available());
        assert!(script.get().is_err());
    }

    mod protocol {
        use super::*;

        #[test]
        fn defaults_without_a_protocol_list() {
            assert_eq!(SdkOptions::default().preferred_protocol(), Protocol::Default);
        }

        #[test]
        fn first_recognized_entry_wins() {
            let options = SdkOptions {
                supported_protocols: vec![
                    "future-protocol".into(),
                    "message-boundaries".into(),
                    "default".into(),
                ],
                ..Default::default()
            };
            assert_eq!(options.preferred_protocol(), Protocol::MessageBoundaries);
        }
    }

    #[test]
    fn missing_hooks_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = SdkConfig::load(dir.path()).unwrap_err();
        assert_eq!(err.code(), codes::INVALID_APP_DIRECTORY);
    }
}
