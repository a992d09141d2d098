use crate::constants::EMPTY_LISTING_LINE;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::core_network::{DataAddress, DataChannel, DataChannelError};
use crate::core_sandbox::sandbox::is_directory;
use crate::helpers::{send_reply, Reply};
use crate::session::{ServerContext, Session};
use log::{error, info, warn};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWrite;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry {
    Directory(String),
    File { name: String, size: u64 },
}

impl ListEntry {
    fn name(&self) -> &str {
        match self {
            ListEntry::Directory(name) => name,
            ListEntry::File { name, .. } => name,
        }
    }
}

/// Immediate children of `dir`, sorted by name. Entries that vanish or
/// cannot be inspected while listing are skipped, and so are links whose
/// target lies outside `root`.
pub async fn read_listing(dir: &Path, root: &Path) -> Result<Vec<ListEntry>, std::io::Error> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        let is_link = entry
            .file_type()
            .await
            .map(|kind| kind.is_symlink())
            .unwrap_or(false);
        if is_link {
            match fs::canonicalize(&path).await {
                Ok(target) if target.starts_with(root) => {}
                Ok(target) => {
                    warn!("Hiding link {:?} to {:?} outside the root", path, target);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping dangling link {:?}: {}", path, e);
                    continue;
                }
            }
        }
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => entries.push(ListEntry::Directory(name)),
            Ok(meta) => entries.push(ListEntry::File {
                name,
                size: meta.len(),
            }),
            Err(e) => warn!("Skipping {:?} in listing: {}", path, e),
        }
    }

    entries.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(entries)
}

/// One CRLF-terminated line per entry, or a single placeholder line.
pub fn format_listing(entries: &[ListEntry]) -> String {
    if entries.is_empty() {
        return format!("{}\r\n", EMPTY_LISTING_LINE);
    }

    let mut listing = String::new();
    for entry in entries {
        match entry {
            ListEntry::Directory(name) => listing.push_str(&format!("{}/\r\n", name)),
            ListEntry::File { name, size } => {
                listing.push_str(&format!("{} ({} bytes)\r\n", name, size))
            }
        }
    }
    listing
}

async fn send_listing(
    addr: DataAddress,
    timeout: Duration,
    dir: &Path,
    root: &Path,
) -> Result<usize, DataChannelError> {
    let mut channel = DataChannel::connect(addr, timeout).await?;
    let result = match read_listing(dir, root).await {
        Ok(entries) => channel.send_text(&format_listing(&entries)).await,
        Err(e) => Err(DataChannelError::Io(e)),
    };
    channel.close().await;
    result
}

/// Handles the LIST FTP command.
///
/// Needs a prior PORT. Once the 150 reply is out the data address is spent,
/// whatever happens to the transfer.
pub async fn handle_list_command<W>(
    writer: &mut W,
    ctx: &ServerContext,
    session: &mut Session,
    _arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    let addr = match session.pending_data_address {
        Some(addr) => addr,
        None => {
            warn!("LIST without PORT from {}", session.who());
            send_reply(writer, &Reply::new(425, "Use PORT first.")).await?;
            return Ok(Flow::Continue);
        }
    };

    let dir = match ctx.sandbox.resolve(&session.working_dir, "") {
        Ok(dir) => dir,
        Err(e) => {
            error!("Working directory {} no longer resolves: {}", session.working_dir, e);
            send_reply(writer, &e.to_ftp_response()).await?;
            return Ok(Flow::Continue);
        }
    };
    if !is_directory(&dir).await {
        warn!("Working directory vanished: {:?}", dir);
        send_reply(writer, &Reply::new(550, "Directory unavailable.")).await?;
        return Ok(Flow::Continue);
    }

    session.pending_data_address = None;
    send_reply(
        writer,
        &Reply::new(150, "Opening ASCII mode data connection for file list."),
    )
    .await?;

    let sent = send_listing(addr, ctx.config.data_timeout(), &dir, ctx.sandbox.root()).await;
    match sent {
        Ok(bytes) => {
            info!("Sent listing of {} ({} bytes) to {}", session.working_dir, bytes, addr);
            send_reply(writer, &Reply::new(226, "Transfer complete.")).await?;
        }
        Err(e) if e.is_connect_failure() => {
            warn!("LIST data connection to {} failed: {}", addr, e);
            send_reply(writer, &e.to_ftp_response()).await?;
        }
        Err(e) => {
            error!("LIST transfer to {} aborted: {}", addr, e);
            send_reply(writer, &e.to_ftp_response()).await?;
        }
    }

    Ok(Flow::Continue)
}
