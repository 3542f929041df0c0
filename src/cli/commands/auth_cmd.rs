//! cli::commands::auth_cmd
//!
//! Inspection of saved credentials.

use chrono::Utc;

use crate::api::SessionApi;
use crate::auth::is_team_id;
use crate::cli::commands::CommandContext;
use crate::error::Result;

/// List saved credentials, one per workspace.
pub async fn list(ctx: &CommandContext) -> Result<()> {
    let auths = ctx.auth.list().await?;
    if auths.is_empty() {
        ctx.io.print("No credentials are saved");
        ctx.io.print("Run `slack login` to authenticate");
        return Ok(());
    }

    let now = Utc::now().timestamp();
    for auth in auths {
        let mut line = format!("{} ({})", auth.team_domain, auth.team_id);
        if !auth.user_id.is_empty() {
            line.push_str(&format!(" user {}", auth.user_id));
        }
        if let Some(last_updated) = auth.last_updated {
            line.push_str(&format!(" updated {}", last_updated.format("%Y-%m-%d")));
        }
        if auth.token_is_expired(now) {
            line.push_str("  [token expired, run `slack login`]");
        }
        ctx.io.print(line);
    }
    Ok(())
}

/// Print the access token for a workspace.
///
/// The lookup runs the usual rotation pass first, so a near-expiry token
/// is refreshed before being handed out.
pub async fn token(ctx: &CommandContext, team: &str) -> Result<()> {
    let auth = if is_team_id(team) {
        ctx.auth.get_by_team_id(team).await?
    } else {
        ctx.auth.get_by_team_domain(team).await?
    };
    ctx.io.print(&auth.token);
    Ok(())
}

/// Revoke an arbitrary token without touching saved credentials.
pub async fn revoke(ctx: &CommandContext, token: &str) -> Result<()> {
    let result = ctx.api.revoke_token(token).await;
    ctx.auth.filter_known_auth_error(result)?;
    ctx.io.print("Token revoked");
    Ok(())
}
