//! hooks::executor
//!
//! Running hook scripts and collecting their responses.
//!
//! # Design
//!
//! Hooks inherit the parent environment plus any per-call variables, and
//! extra arguments arrive as `--key=value` flags so scripts can parse them
//! with any flag library.
//!
//! Two response protocols exist. The default protocol treats the whole of
//! trimmed stdout as the response, which breaks when the script also logs
//! to stdout. The message-boundary protocol fixes that: the CLI passes a
//! random boundary nonce, the script wraps its one response in it, and
//! everything outside the boundary is diagnostic output.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

use uuid::Uuid;

use crate::error::{codes, Error, Result};
use crate::hooks::config::{HookScript, Protocol, SdkConfig};
use crate::ui::IoStreams;

/// One hook invocation.
#[derive(Debug, Clone, Default)]
pub struct HookExecOpts {
    pub hook: HookScript,
    /// Extra arguments, passed as `--key=value` flags.
    pub args: BTreeMap<String, String>,
    /// Extra environment variables, added to the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Directory to run in, usually the project root.
    pub directory: Option<PathBuf>,
}

/// Runs hooks and returns their response payload.
pub trait HookExecutor {
    fn execute(&self, opts: &HookExecOpts) -> Result<String>;
}

/// The executor matching the protocol the SDK declared in `hooks.json`.
pub fn executor_for(io: IoStreams, config: &SdkConfig) -> Box<dyn HookExecutor> {
    match config.config.preferred_protocol() {
        Protocol::MessageBoundaries => Box::new(MessageBoundaryExecutor { io, boundary: None }),
        Protocol::Default => Box::new(DefaultExecutor { io }),
    }
}

/// Split a hook command line and fold in the per-call arguments.
fn build_command(opts: &HookExecOpts, extra_args: &[String]) -> Result<Command> {
    let command_line = opts.hook.get()?;
    let mut fields = command_line.split_whitespace();
    let program = match fields.next() {
        Some(program) => program,
        None => {
            return Err(Error::new(codes::SDK_HOOK_NOT_FOUND)
                .with_message(format!("The command for \"{}\" was not found", opts.hook.name)));
        }
    };

    let mut command = Command::new(program);
    command.args(fields);
    for (key, value) in &opts.args {
        command.arg(format!("--{}={}", key, value));
    }
    command.args(extra_args);
    command.envs(&opts.env);
    if let Some(ref directory) = opts.directory {
        command.current_dir(directory);
    }
    Ok(command)
}

fn run(command: &mut Command, hook_name: &str) -> Result<std::process::Output> {
    let output = command.output().map_err(|err| {
        Error::new(codes::SDK_HOOK_INVOCATION_FAILED)
            .with_message(format!("Error running \"{}\" command", hook_name))
            .with_source(err)
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::new(codes::SDK_HOOK_INVOCATION_FAILED).with_message(format!(
            "Error running \"{}\" command: {}",
            hook_name,
            stderr.trim()
        )));
    }
    Ok(output)
}

/// Original protocol: trimmed stdout is the response.
pub struct DefaultExecutor {
    io: IoStreams,
}

impl HookExecutor for DefaultExecutor {
    fn execute(&self, opts: &HookExecOpts) -> Result<String> {
        let mut command = build_command(opts, &[])?;
        self.io
            .debug(format!("starting hook command: {}", opts.hook.command));
        let output = run(&mut command, &opts.hook.name)?;
        self.io
            .debug(format!("finished hook command: {}", opts.hook.command));
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Message-boundary protocol: the response is the text between a pair of
/// boundary nonce markers on stdout.
pub struct MessageBoundaryExecutor {
    io: IoStreams,
    /// Fixed boundary for tests; a fresh nonce is generated otherwise.
    boundary: Option<String>,
}

impl MessageBoundaryExecutor {
    #[cfg(test)]
    fn with_boundary(io: IoStreams, boundary: &str) -> Self {
        Self {
            io,
            boundary: Some(boundary.to_string()),
        }
    }

    fn boundary(&self) -> String {
        self.boundary
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
    }
}

impl HookExecutor for MessageBoundaryExecutor {
    fn execute(&self, opts: &HookExecOpts) -> Result<String> {
        let boundary = self.boundary();
        let protocol_args = vec![
            format!("--protocol={}", Protocol::MessageBoundaries.as_str()),
            format!("--boundary={}", boundary),
        ];
        let mut command = build_command(opts, &protocol_args)?;
        self.io
            .debug(format!("starting hook command: {}", opts.hook.command));
        let output = run(&mut command, &opts.hook.name)?;
        self.io
            .debug(format!("finished hook command: {}", opts.hook.command));

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(extract_bounded(&stdout, &boundary))
    }
}

/// Collect the text between successive pairs of boundary markers.
///
/// Output with no boundary pair yields an empty response; diagnostic text
/// outside the markers is dropped.
fn extract_bounded(output: &str, boundary: &str) -> String {
    let parts: Vec<&str> = output.split(boundary).collect();
    let mut response = String::new();
    for (i, part) in parts.iter().enumerate() {
        // Odd segments sit between an opening and a closing marker; the
        // last segment after an unterminated marker is dropped.
        if i % 2 == 1 && i + 1 < parts.len() {
            response.push_str(part);
        }
    }
    response.trim().to_string()
}
