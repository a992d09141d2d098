use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::helpers::{send_reply, Reply};
use crate::session::{ServerContext, Session};
use tokio::io::AsyncWrite;

pub async fn handle_noop_command<W>(
    writer: &mut W,
    _ctx: &ServerContext,
    _session: &mut Session,
    _arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    send_reply(writer, &Reply::new(200, "NOOP ok.")).await?;
    Ok(Flow::Continue)
}
