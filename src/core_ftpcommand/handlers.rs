use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::ftpcommand::{FtpCommand, ParsedCommand};
use crate::core_ftpcommand::{cwd, help, list, noop, pass, pwd, quit, retr, stor, user};
use crate::core_network::port;
use crate::helpers::{send_reply, Reply};
use crate::session::{LoginState, ServerContext, Session};
use log::{error, warn};
use tokio::io::AsyncWrite;

/// What the control loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Routes one parsed command to its handler.
///
/// Handler failures stop here: internal errors become a 500 reply and the
/// session continues. Only a broken control connection is returned.
pub async fn dispatch_command<W>(
    writer: &mut W,
    ctx: &ServerContext,
    session: &mut Session,
    parsed: &ParsedCommand,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    let command = match parsed.command() {
        Some(command) => command,
        None => {
            warn!("Unknown command from {}: {}", session.who(), parsed.verb);
            send_reply(writer, &Reply::new(500, format!("Unknown command: {}", parsed.verb)))
                .await?;
            return Ok(Flow::Continue);
        }
    };

    if command.requires_auth() && session.login_state() != LoginState::Authenticated {
        warn!("{} rejected before login", parsed.verb);
        send_reply(writer, &Reply::new(530, "Please login with USER and PASS.")).await?;
        return Ok(Flow::Continue);
    }

    let arg = parsed.arg.as_str();
    let result = match command {
        FtpCommand::USER => user::handle_user_command(writer, ctx, session, arg).await,
        FtpCommand::PASS => pass::handle_pass_command(writer, ctx, session, arg).await,
        FtpCommand::QUIT => quit::handle_quit_command(writer, ctx, session, arg).await,
        FtpCommand::HELP => help::handle_help_command(writer, ctx, session, arg).await,
        FtpCommand::NOOP => noop::handle_noop_command(writer, ctx, session, arg).await,
        FtpCommand::CWD => cwd::handle_cwd_command(writer, ctx, session, arg).await,
        FtpCommand::PWD => pwd::handle_pwd_command(writer, ctx, session, arg).await,
        FtpCommand::PORT => port::handle_port_command(writer, ctx, session, arg).await,
        FtpCommand::LIST => list::handle_list_command(writer, ctx, session, arg).await,
        FtpCommand::RETR => retr::handle_retr_command(writer, ctx, session, arg).await,
        FtpCommand::STOR => stor::handle_stor_command(writer, ctx, session, arg).await,
    };

    match result {
        Ok(flow) => Ok(flow),
        Err(CommandError::Control(e)) => Err(e),
        Err(CommandError::Internal(reason)) => {
            error!("Error handling command {}: {}", parsed.verb, reason);
            send_reply(writer, &Reply::new(500, "Internal server error.")).await?;
            Ok(Flow::Continue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_ftpcommand::ftpcommand::parse_command_line;
    use crate::test_support::{replies, TestServer};

    /// Runs each line through the dispatcher and returns the reply codes.
    async fn run(server: &TestServer, session: &mut Session, lines: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        for line in lines {
            if let Some(parsed) = parse_command_line(line) {
                dispatch_command(&mut out, &server.ctx, session, &parsed)
                    .await
                    .unwrap();
            }
        }
        replies(&out)
    }

    fn codes(lines: &[String]) -> Vec<&str> {
        lines.iter().map(|line| &line[..3]).collect()
    }

    #[tokio::test]
    async fn test_gated_commands_need_login() {
        let server = TestServer::new();
        let mut session = Session::new();
        let lines = run(
            &server,
            &mut session,
            &["PWD", "CWD pub", "PORT 127,0,0,1,4,1", "LIST", "RETR notes.txt", "STOR x"],
        )
        .await;
        assert_eq!(codes(&lines), vec!["530"; 6]);
        assert!(session.working_dir.is_root());
        assert!(session.pending_data_address.is_none());
    }

    #[tokio::test]
    async fn test_unknown_verb_is_named() {
        let server = TestServer::new();
        let mut session = Session::new();
        let lines = run(&server, &mut session, &["mkd stuff"]).await;
        assert_eq!(lines, vec!["500 Unknown command: MKD"]);

        let mut session = server.logged_in_session();
        let lines = run(&server, &mut session, &["XYZZY"]).await;
        assert_eq!(lines, vec!["500 Unknown command: XYZZY"]);
    }

    #[tokio::test]
    async fn test_pass_before_user_is_out_of_sequence() {
        let server = TestServer::new();
        let mut session = Session::new();
        let lines = run(&server, &mut session, &["PASS 123456"]).await;
        assert_eq!(codes(&lines), vec!["503"]);
    }

    #[tokio::test]
    async fn test_failed_pass_clears_pending_user() {
        let server = TestServer::new();
        let mut session = Session::new();
        let lines = run(
            &server,
            &mut session,
            &["USER alice", "PASS wrong", "PASS 123456"],
        )
        .await;
        assert_eq!(codes(&lines), vec!["331", "530", "503"]);
        assert_eq!(session.login_state(), LoginState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_login_then_relogin_drops_auth() {
        let server = TestServer::new();
        let mut session = Session::new();
        let lines = run(&server, &mut session, &["user alice", "pass 123456"]).await;
        assert_eq!(codes(&lines), vec!["331", "230"]);
        assert_eq!(session.login_state(), LoginState::Authenticated);

        let lines = run(&server, &mut session, &["USER bob", "PWD"]).await;
        assert_eq!(codes(&lines), vec!["331", "530"]);
        assert_eq!(session.login_state(), LoginState::AwaitingPassword);
    }

    #[tokio::test]
    async fn test_help_and_noop_work_before_login() {
        let server = TestServer::new();
        let mut session = Session::new();
        let lines = run(&server, &mut session, &["HELP", "NOOP"]).await;
        assert!(lines[0].starts_with("214-"));
        assert!(lines.iter().any(|line| line.starts_with("214 ")));
        assert_eq!(lines.last().unwrap(), "200 NOOP ok.");
    }

    #[tokio::test]
    async fn test_quit_closes() {
        let server = TestServer::new();
        let mut session = Session::new();
        let mut out = Vec::new();
        let parsed = parse_command_line("EXIT").unwrap();
        let flow = dispatch_command(&mut out, &server.ctx, &mut session, &parsed)
            .await
            .unwrap();
        assert_eq!(flow, Flow::Close);
        assert_eq!(replies(&out), vec!["221 Goodbye."]);
    }
}
