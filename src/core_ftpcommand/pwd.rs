// src/core_ftpcommand/pwd.rs
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::helpers::{send_reply, Reply};
use crate::session::{ServerContext, Session};
use tokio::io::AsyncWrite;

pub async fn handle_pwd_command<W>(
    writer: &mut W,
    _ctx: &ServerContext,
    session: &mut Session,
    _arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    // Embedded quotes are doubled, as RFC 959 asks for 257 replies
    let quoted = session.working_dir.as_str().replace('"', "\"\"");
    let reply = Reply::new(257, format!("\"{}\" is the current directory.", quoted));
    send_reply(writer, &reply).await?;
    Ok(Flow::Continue)
}
