use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::Flow;
use crate::helpers::send_multiline;
use crate::session::{ServerContext, Session};
use tokio::io::AsyncWrite;

const HELP_LINES: &[&str] = &[
    " USER <name>               log in as <name>",
    " PASS <password>           complete the login",
    " CWD <dir>                 change the working directory",
    " PWD                       print the working directory",
    " PORT h1,h2,h3,h4,p1,p2    set the data address for the next transfer",
    " LIST                      list the working directory",
    " RETR <file>               download a file",
    " STOR <file>               upload a file",
    " NOOP                      do nothing",
    " HELP                      show this message",
    " QUIT                      close the connection (EXIT also works)",
];

pub async fn handle_help_command<W>(
    writer: &mut W,
    _ctx: &ServerContext,
    _session: &mut Session,
    _arg: &str,
) -> Result<Flow, CommandError>
where
    W: AsyncWrite + Unpin,
{
    let mut lines = vec!["The following commands are recognized:".to_string()];
    lines.extend(HELP_LINES.iter().map(|line| line.to_string()));
    send_multiline(writer, 214, &lines, "Help OK.").await?;
    Ok(Flow::Continue)
}
