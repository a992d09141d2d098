use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::core_network::{DataChannel, DataChannelError};
use crate::core_sandbox::sandbox::is_directory;
use crate::helpers::{send_reply, Reply};
use crate::session::{ServerContext, Session};
use log::{error, info, warn};
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWrite;

async fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        warn!("Could not remove partial upload {:?}: {}", path, e);
    }
}

/// Handles the STOR (Store File) FTP command.
///
/// Uploads land inside the root only. A failed transfer removes whatever
/// was written so far.
pub async fn handle_stor_command<W>(
    writer: &mut W,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    if arg.trim().is_empty() {
        warn!("STOR command received with no arguments");
        send_reply(writer, &Reply::new(501, "STOR requires a file name.")).await?;
        return Ok(Flow::Continue);
    }

    let addr = match session.pending_data_address {
        Some(addr) => addr,
        None => {
            send_reply(writer, &Reply::new(425, "Use PORT first.")).await?;
            return Ok(Flow::Continue);
        }
    };

    let path = match ctx.sandbox.resolve(&session.working_dir, arg) {
        Ok(path) => path,
        Err(e) => {
            warn!("STOR {:?} refused for {}: {}", arg, session.who(), e);
            send_reply(writer, &e.to_ftp_response()).await?;
            return Ok(Flow::Continue);
        }
    };

    let parent_ok = match path.parent() {
        Some(parent) => is_directory(parent).await,
        None => false,
    };
    if path == ctx.sandbox.root() || is_directory(&path).await || !parent_ok {
        warn!("STOR target is not a storable file: {:?}", path);
        send_reply(writer, &Reply::new(550, "Cannot store file here.")).await?;
        return Ok(Flow::Continue);
    }

    session.pending_data_address = None;
    send_reply(
        writer,
        &Reply::new(150, format!("Opening data connection for {}.", arg.trim())),
    )
    .await?;

    let mut channel = match DataChannel::connect(addr, ctx.config.data_timeout()).await {
        Ok(channel) => channel,
        Err(e) => {
            warn!("STOR data connection to {} failed: {}", addr, e);
            send_reply(writer, &e.to_ftp_response()).await?;
            return Ok(Flow::Continue);
        }
    };

    let mut file = match File::create(&path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to create file: {:?}, error: {}", path, e);
            channel.close().await;
            send_reply(writer, &Reply::new(550, "Cannot create file.")).await?;
            return Ok(Flow::Continue);
        }
    };

    let result: Result<u64, DataChannelError> = channel.receive_to_writer(&mut file).await;
    channel.close().await;
    drop(file);

    match result {
        Ok(bytes) => {
            info!("File stored successfully: {:?} ({} bytes)", path, bytes);
            send_reply(writer, &Reply::new(226, "Transfer complete.")).await?;
        }
        Err(e) => {
            error!("STOR transfer from {} aborted: {}", addr, e);
            discard_partial(&path).await;
            send_reply(writer, &e.to_ftp_response()).await?;
        }
    }

    Ok(Flow::Continue)
}
