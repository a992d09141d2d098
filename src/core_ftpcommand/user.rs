use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::helpers::{send_reply, Reply};
use crate::session::{ServerContext, Session};
use log::{info, warn};
use tokio::io::AsyncWrite;

/// Handles the USER FTP command.
///
/// Every USER restarts the login sequence: authentication is dropped and the
/// name becomes the pending user, even when the account does not exist.
pub async fn handle_user_command<W>(
    writer: &mut W,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    let username = arg.trim();
    if username.is_empty() {
        warn!("USER command received with no arguments");
        send_reply(writer, &Reply::new(501, "USER requires a user name.")).await?;
        return Ok(Flow::Continue);
    }

    if session.authenticated {
        info!("{} restarted the login sequence as {}", session.who(), username);
    }
    session.authenticated = false;
    session.username = None;
    session.pending_user = Some(username.to_string());

    if !ctx.users.exists(username) {
        warn!("Login attempt for unknown user: {}", username);
        send_reply(writer, &Reply::new(530, "Invalid user name.")).await?;
        return Ok(Flow::Continue);
    }

    info!("Username accepted: {}", username);
    send_reply(writer, &Reply::new(331, "User name okay, need password.")).await?;
    Ok(Flow::Continue)
}
