//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler validates its arguments, calls into the service layer,
//! and formats output through [`crate::ui::IoStreams`]. Handlers never
//! construct clients or stores themselves.

mod auth_cmd;
mod doctor;
mod login;
mod logout;
mod upgrade;

pub use auth_cmd::{list as auth_list, revoke as auth_revoke, token as auth_token};
pub use doctor::doctor;
pub use login::login;
pub use logout::logout;
pub use upgrade::upgrade;

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::AuthStore;
use crate::cli::args::{AuthCommand, Command};
use crate::config::SystemConfigStore;
use crate::error::Result;
use crate::ui::IoStreams;
use crate::update::{Release, Upgrader};

/// Shared services handed to every command handler.
pub struct CommandContext {
    pub io: IoStreams,
    pub config_dir: PathBuf,
    pub system: Arc<SystemConfigStore>,
    pub api: Arc<ApiClient>,
    pub auth: AuthStore,
    /// Raw token passed with `--token`, bypassing saved credentials.
    pub token: Option<String>,
    pub force: bool,
}

/// Dispatch a command to its handler.
pub async fn dispatch(command: Command, ctx: &CommandContext) -> Result<()> {
    match command {
        Command::Login { token, no_prompt } => login(ctx, token.as_deref(), no_prompt).await,
        Command::Logout { team, all } => logout(ctx, team.as_deref(), all).await,
        Command::Auth { subcommand } => match subcommand {
            AuthCommand::List => auth_list(ctx).await,
            AuthCommand::Token { team } => auth_token(ctx, &team).await,
            AuthCommand::Revoke { token } => auth_cmd::revoke(ctx, &token).await,
        },
        Command::Doctor => doctor(ctx).await,
        Command::Upgrade { check } => upgrade(ctx, check).await,
        Command::Version => {
            ctx.io.print(env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Tell the user a newer release exists and offer to install it.
pub async fn notify_update(ctx: &CommandContext, release: &Release) -> Result<()> {
    ctx.io.section(format!(
        "A new version of the Slack CLI is available:\n   {} -> {}\n\n   \
         You can read the release notes at:\n   https://docs.slack.dev/changelog",
        env!("CARGO_PKG_VERSION"),
        release.version
    ));
    let install = ctx
        .io
        .confirm("Do you want to auto-update to the latest version now?")?;
    if install {
        let upgrader = Upgrader::new(ctx.io, &ctx.config_dir, env!("CARGO_PKG_VERSION"));
        upgrader.upgrade(release).await?;
    }
    Ok(())
}
