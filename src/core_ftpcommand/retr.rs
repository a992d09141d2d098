use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::core_network::{DataAddress, DataChannel, DataChannelError};
use crate::core_sandbox::sandbox::is_file;
use crate::helpers::{send_reply, Reply};
use crate::session::{ServerContext, Session};
use log::{error, info, warn};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWrite;

async fn send_file(
    addr: DataAddress,
    timeout: Duration,
    file: &mut File,
) -> Result<u64, DataChannelError> {
    let mut channel = DataChannel::connect(addr, timeout).await?;
    let result = channel.send_from_reader(file).await;
    channel.close().await;
    result
}

/// Handles the RETR (Retrieve) FTP command.
///
/// The file is streamed in fixed-size chunks over the data connection
/// advertised by the last PORT, which is consumed by the attempt.
pub async fn handle_retr_command<W>(
    writer: &mut W,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    if arg.trim().is_empty() {
        warn!("RETR command received with no arguments");
        send_reply(writer, &Reply::new(501, "RETR requires a file name.")).await?;
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
            warn!("RETR {:?} refused for {}: {}", arg, session.who(), e);
            send_reply(writer, &e.to_ftp_response()).await?;
            return Ok(Flow::Continue);
        }
    };

    if !is_file(&path).await {
        warn!("RETR target is not a file: {:?}", path);
        send_reply(writer, &Reply::new(550, "File unavailable.")).await?;
        return Ok(Flow::Continue);
    }

    let mut file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            error!("File could not be opened: {:?}, error: {}", path, e);
            send_reply(writer, &Reply::new(550, "File unavailable.")).await?;
            return Ok(Flow::Continue);
        }
    };

    session.pending_data_address = None;
    send_reply(
        writer,
        &Reply::new(150, format!("Opening data connection for {}.", arg.trim())),
    )
    .await?;

    match send_file(addr, ctx.config.data_timeout(), &mut file).await {
        Ok(bytes) => {
            info!("File transfer completed successfully: {:?} ({} bytes)", path, bytes);
            send_reply(writer, &Reply::new(226, "Transfer complete.")).await?;
        }
        Err(e) if e.is_connect_failure() => {
            warn!("RETR data connection to {} failed: {}", addr, e);
            send_reply(writer, &e.to_ftp_response()).await?;
        }
        Err(e) => {
            error!("RETR transfer of {:?} to {} aborted: {}", path, addr, e);
            send_reply(writer, &e.to_ftp_response()).await?;
        }
    }

    Ok(Flow::Continue)
}
