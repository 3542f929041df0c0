//! cli::commands::logout
//!
//! Revoke credentials remotely and remove them locally.
//!
//! Revocation failures for tokens that are already dead (revoked,
//! expired, or never valid) are downgraded to debug output so the local
//! record is still cleaned up.

use crate::api::SessionApi;
use crate::auth::{is_team_id, Auth};
use crate::cli::commands::CommandContext;
use crate::error::{codes, Error, Result};

/// Run the logout command.
pub async fn logout(ctx: &CommandContext, team: Option<&str>, all: bool) -> Result<()> {
    // A raw token has no saved record; just revoke it.
    if let Some(ref token) = ctx.token {
        let result = ctx.api.revoke_token(token).await;
        ctx.auth.filter_known_auth_error(result)?;
        ctx.io.print("Token revoked");
        return Ok(());
    }

    let targets = resolve_targets(ctx, team, all).await?;
    for auth in targets {
        let original_host = ctx.api.host();
        ctx.api.set_host(&ctx.auth.resolve_api_host(&auth));
        let result = ctx.api.revoke_token(&auth.token).await;
        ctx.api.set_host(&original_host);
        ctx.auth.filter_known_auth_error(result)?;

        ctx.auth.delete(&auth.team_id).await?;
        ctx.io
            .print(format!("Logged out of {} ({})", auth.team_domain, auth.team_id));
    }
    Ok(())
}

/// Decide which saved credentials to log out of.
///
/// With `--all`, every credential; with `--team`, the named one; with a
/// single saved credential, that one; otherwise the user must choose.
async fn resolve_targets(
    ctx: &CommandContext,
    team: Option<&str>,
    all: bool,
) -> Result<Vec<Auth>> {
    if all {
        return ctx.auth.list().await;
    }
    if let Some(team) = team {
        let auth = if is_team_id(team) {
            ctx.auth.get_by_team_id(team).await?
        } else {
            ctx.auth.get_by_team_domain(team).await?
        };
        return Ok(vec![auth]);
    }
    let auths = ctx.auth.list().await?;
    match auths.len() {
        0 => Err(Error::new(codes::CREDENTIALS_NOT_FOUND)
            .with_message("No saved credentials to log out of")),
        1 => Ok(auths),
        _ => Err(Error::new(codes::TEAM_NOT_FOUND)
            .with_message("More than one workspace is logged in")
            .with_remediation("Pass --team <domain or ID> or --all")),
    }
}
