//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Wire up the config stores, API client, and credential store
//! - Start the background release check and report its result
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Commands receive a [`commands::CommandContext`]
//! holding the shared services and never construct clients themselves.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::sync::Arc;

use anyhow::Result;

use crate::api::{ApiClient, DEFAULT_DEV_HOST, DEFAULT_PROD_HOST};
use crate::auth::AuthStore;
use crate::config::{resolve_config_dir, SystemConfigStore};
use crate::ui::{IoStreams, Verbosity};
use crate::update::UpdateChecker;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let io = IoStreams::new(Verbosity::from_flag(cli.verbose));

    let config_dir = resolve_config_dir(cli.config_dir.as_deref())?;
    let system = Arc::new(SystemConfigStore::new(&config_dir));
    system.initialize()?;

    // Only an explicit choice becomes a flag host; it outranks the host
    // stored on a credential record.
    let host_flag = match (&cli.apihost, cli.slackdev) {
        (Some(host), _) => Some(host.clone()),
        (None, true) => Some(DEFAULT_DEV_HOST.to_string()),
        (None, false) => None,
    };
    let api = Arc::new(ApiClient::new(
        host_flag.as_deref().unwrap_or(DEFAULT_PROD_HOST),
    ));
    let auth = AuthStore::new(api.clone(), &config_dir, io).with_host_flag(host_flag);

    // A raw --token is often used in scripts, so it also disables the
    // release check.
    let check_enabled = !cli.skip_update && cli.token.is_none();
    let check = UpdateChecker::new(env!("CARGO_PKG_VERSION"), check_enabled).start(
        cli.command.name(),
        system.clone(),
        io,
        cli.force && cli.command.name() != "upgrade",
    );

    let ctx = commands::CommandContext {
        io,
        config_dir,
        system,
        api,
        auth,
        token: cli.token,
        force: cli.force,
    };

    let result = commands::dispatch(cli.command, &ctx).await;

    if let Some(release) = check.finish().await {
        commands::notify_update(&ctx, &release).await?;
    }

    result.map_err(Into::into)
}
