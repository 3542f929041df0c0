//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--apihost <url>`: Target a different API host
//! - `--token <token>`: Use a raw token instead of saved credentials
//! - `--config-dir <path>`: Override the config directory location
//! - `--skip-update` / `-s`: Skip the background release check
//! - `--verbose` / `-v`: Include debug output
//! - `--force` / `-f`: Skip confirmations and rate limits

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Slack CLI - manage apps, auth, and your local project
#[derive(Parser, Debug)]
#[command(name = "slack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Slack API host to use, e.g. https://dev1234.slack.com
    #[arg(long, global = true, value_name = "URL")]
    pub apihost: Option<String>,

    /// Use the development API host
    #[arg(long, global = true, conflicts_with = "apihost")]
    pub slackdev: bool,

    /// Access token to use instead of saved credentials
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Directory for credentials and configuration
    #[arg(long = "config-dir", global = true, value_name = "PATH")]
    pub config_dir: Option<PathBuf>,

    /// Skip the check for a newer release
    #[arg(short, long, global = true)]
    pub skip_update: bool,

    /// Include debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmations and update rate limits
    #[arg(short, long, global = true)]
    pub force: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in to a workspace and save the credential
    #[command(name = "login")]
    Login {
        /// Token to validate and save; prompted for when omitted
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,

        /// Fail instead of prompting when no token is given
        #[arg(long)]
        no_prompt: bool,
    },

    /// Revoke a saved credential and remove it
    #[command(name = "logout")]
    Logout {
        /// Workspace domain or team ID to log out of
        #[arg(long, value_name = "TEAM")]
        team: Option<String>,

        /// Log out of every saved workspace
        #[arg(long)]
        all: bool,
    },

    /// Inspect saved credentials
    #[command(name = "auth")]
    Auth {
        #[command(subcommand)]
        subcommand: AuthCommand,
    },

    /// Check your environment and project for problems
    #[command(name = "doctor")]
    Doctor,

    /// Update the CLI to the latest release
    #[command(name = "upgrade")]
    Upgrade {
        /// Only report whether an update exists
        #[arg(long)]
        check: bool,
    },

    /// Print the version number
    #[command(name = "version")]
    Version,
}

/// Subcommands of `slack auth`.
#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// List saved credentials
    #[command(name = "list")]
    List,

    /// Print the token for a workspace
    #[command(name = "token")]
    Token {
        /// Workspace domain or team ID
        #[arg(long, value_name = "TEAM")]
        team: String,
    },

    /// Revoke an arbitrary token
    #[command(name = "revoke")]
    Revoke {
        /// Token to revoke
        #[arg(long, value_name = "TOKEN")]
        token: String,
    },
}

impl Command {
    /// Name used for update-check gating.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::Logout { .. } => "logout",
            Command::Auth { .. } => "auth",
            Command::Doctor => "doctor",
            Command::Upgrade { .. } => "upgrade",
            Command::Version => "version",
        }
    }
}
