use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::helpers::{send_reply, Reply};
use crate::session::{ServerContext, Session};
use log::{info, warn};
use std::sync::Arc;
use tokio::io::AsyncWrite;

/// Handles the PASS FTP command.
///
/// The pending user is consumed whatever the outcome. The password itself is
/// never logged.
pub async fn handle_pass_command<W>(
    writer: &mut W,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    let password = arg.trim();
    if password.is_empty() {
        warn!("PASS command received with no arguments");
        send_reply(writer, &Reply::new(501, "PASS requires a password.")).await?;
        return Ok(Flow::Continue);
    }

    let username = match session.pending_user.take() {
        Some(username) => username,
        None => {
            warn!("PASS received before USER");
            send_reply(writer, &Reply::new(503, "Login with USER first.")).await?;
            return Ok(Flow::Continue);
        }
    };
    session.authenticated = false;
    session.username = None;

    // bcrypt is deliberately slow, keep it off the async workers
    let users = Arc::clone(&ctx.users);
    let (name, secret) = (username.clone(), password.to_string());
    let verified = tokio::task::spawn_blocking(move || users.verify(&name, &secret))
        .await
        .map_err(|e| CommandError::Internal(format!("password check failed: {}", e)))?;

    if verified {
        info!("User {} logged in", username);
        session.authenticated = true;
        let reply = Reply::new(230, format!("User {} logged in, proceed.", username));
        session.username = Some(username);
        send_reply(writer, &reply).await?;
    } else {
        warn!("Failed login for user {}", username);
        send_reply(writer, &Reply::new(530, "Login incorrect.")).await?;
    }

    Ok(Flow::Continue)
}
