use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::helpers::{send_reply, Reply};
use crate::session::{ServerContext, Session};
use log::info;
use tokio::io::AsyncWrite;

/// Handles QUIT and EXIT. The control loop closes the connection once the
/// reply is out.
pub async fn handle_quit_command<W>(
    writer: &mut W,
    _ctx: &ServerContext,
    session: &mut Session,
    _arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    info!("Received QUIT command from {}. Closing connection.", session.who());
    send_reply(writer, &Reply::new(221, "Goodbye.")).await?;
    Ok(Flow::Close)
}
