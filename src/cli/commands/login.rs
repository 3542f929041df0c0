//! cli::commands::login
//!
//! Validate a token and save the credential for its workspace.

use crate::cli::commands::CommandContext;
use crate::error::{codes, Error, Result};

/// Run the login command.
///
/// The token comes from `--token`, the global `--token` flag, or an
/// interactive prompt. It is validated with `auth.test` before being
/// saved, so an invalid token never lands in the credential file.
pub async fn login(ctx: &CommandContext, token: Option<&str>, no_prompt: bool) -> Result<()> {
    let token = match token.or(ctx.token.as_deref()) {
        Some(token) => token.to_string(),
        None if no_prompt => {
            return Err(Error::new(codes::CREDENTIALS_NOT_FOUND)
                .with_message("A token is required with --no-prompt")
                .with_remediation("Pass one with --token <token>"));
        }
        None => ctx.io.prompt("Enter your access token:")?,
    };

    let auth = ctx.auth.auth_with_token(&token).await?;
    let saved = ctx.auth.set(&auth).await?;

    ctx.io.print(format!(
        "Logged in to {} ({}) as user {}",
        saved.team_domain, saved.team_id, saved.user_id
    ));
    Ok(())
}
