//! cli::commands::upgrade
//!
//! Explicit, blocking version of the release check and self-update.

use crate::cli::commands::CommandContext;
use crate::error::Result;
use crate::update::{check_sdk_update, MetadataClient, Upgrader, METADATA_URL};

/// Run the upgrade command.
///
/// With `--check`, only report whether updates exist. The project SDK is
/// given a chance to report its own updates through the `check-update`
/// hook when run inside a project.
pub async fn upgrade(ctx: &CommandContext, check_only: bool) -> Result<()> {
    ctx.io.section("Checking for updates...");
    let current = env!("CARGO_PKG_VERSION");
    let client = MetadataClient::new(METADATA_URL);
    let release = client.check_for_update(current).await?;

    if let Ok(cwd) = std::env::current_dir() {
        if let Some(sdk_update) = check_sdk_update(ctx.io, &cwd) {
            ctx.io.print(format!("SDK update available: {}", sdk_update));
        }
    }

    let release = match release {
        None => {
            ctx.io
                .print(format!("The Slack CLI is up to date ({})", current));
            return Ok(());
        }
        Some(release) => release,
    };

    ctx.io.print(format!(
        "A new version is available: {} -> {}",
        current, release.version
    ));
    if check_only {
        return Ok(());
    }
    if !ctx.force {
        let confirmed = ctx
            .io
            .confirm(format!("Update to version {} now?", release.version))?;
        if !confirmed {
            return Ok(());
        }
    }

    Upgrader::new(ctx.io, &ctx.config_dir, current)
        .upgrade(&release)
        .await
}
