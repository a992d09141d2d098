use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::core_sandbox::sandbox::is_directory;
use crate::helpers::{send_reply, Reply};
use crate::session::{ServerContext, Session};
use log::{info, warn};
use tokio::io::AsyncWrite;

/// Handles the CWD FTP command.
///
/// The working directory only changes once the target is known to be an
/// existing directory inside the root.
pub async fn handle_cwd_command<W>(
    writer: &mut W,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    if arg.trim().is_empty() {
        warn!("CWD command received with no arguments");
        send_reply(writer, &Reply::new(501, "CWD requires a directory.")).await?;
        return Ok(Flow::Continue);
    }

    let target = match ctx.sandbox.resolve(&session.working_dir, arg) {
        Ok(target) => target,
        Err(e) => {
            warn!("CWD {:?} refused for {}: {}", arg, session.who(), e);
            send_reply(writer, &e.to_ftp_response()).await?;
            return Ok(Flow::Continue);
        }
    };

    if !is_directory(&target).await {
        warn!("CWD target is not a directory: {:?}", target);
        send_reply(writer, &Reply::new(550, "Failed to change directory.")).await?;
        return Ok(Flow::Continue);
    }

    session.working_dir = ctx
        .sandbox
        .to_virtual(&target)
        .map_err(|e| CommandError::Internal(e.to_string()))?;

    info!("Directory successfully changed to: {}", session.working_dir);
    send_reply(
        writer,
        &Reply::new(250, format!("Directory changed to {}.", session.working_dir)),
    )
    .await?;
    Ok(Flow::Continue)
}
