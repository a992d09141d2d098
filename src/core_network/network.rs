use crate::constants::{ACCEPT_ERROR_BACKOFF, MAX_COMMAND_LINE};
use crate::core_ftpcommand::ftpcommand::parse_command_line;
use crate::core_ftpcommand::handlers::{dispatch_command, Flow};
use crate::helpers::{send_multiline, send_reply, Reply};
use crate::session::{ServerContext, Session};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{watch, Semaphore};
use tokio::time::timeout;

/// Resolves once shutdown has been signalled. A dropped sender never signals.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub async fn start_server(ctx: Arc<ServerContext>, shutdown: watch::Receiver<bool>) -> Result<()> {
    let server = &ctx.config.server;
    let bind_addr = format!("{}:{}", server.listen_address, server.listen_port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Server listening on {}", bind_addr);

    serve(listener, ctx, shutdown).await
}

/// Accept loop. At most `max_connections` sessions run at once; further
/// clients wait in the listen backlog until a slot frees up.
pub async fn serve(
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let slots = Arc::new(Semaphore::new(ctx.config.server.max_connections));

    loop {
        let permit = tokio::select! {
            permit = Arc::clone(&slots).acquire_owned() => {
                permit.context("Connection limiter closed")?
            }
            _ = wait_for_shutdown(&mut shutdown) => break,
        };

        let (socket, addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    pause_after_accept_error(&e).await;
                    continue;
                }
            },
            _ = wait_for_shutdown(&mut shutdown) => break,
        };
        info!("New connection from {}", addr);

        let ctx = Arc::clone(&ctx);
        let session_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, ctx, session_shutdown).await {
                warn!("Connection error for {}: {}", addr, e);
            }
            info!("Connection closed for {}", addr);
            drop(permit);
        });
    }

    info!("Listener stopped, no new connections accepted");
    Ok(())
}

/// Errors such as EMFILE persist until a descriptor frees up, so the
/// loop waits a little instead of retrying at once.
async fn pause_after_accept_error(e: &std::io::Error) {
    warn!(
        "Failed to accept connection: {}, retrying in {:?}",
        e, ACCEPT_ERROR_BACKOFF
    );
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

async fn send_greeting<W>(writer: &mut W, ctx: &ServerContext) -> Result<(), std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    let greeting = &ctx.config.server.greeting;
    if ctx.banner.is_empty() {
        send_reply(writer, &Reply::new(220, greeting.as_str())).await
    } else {
        send_multiline(writer, 220, &ctx.banner, greeting).await
    }
}

/// Runs one control connection until QUIT, EOF, a read fault, the idle
/// timeout or server shutdown.
pub async fn handle_connection<S>(
    stream: S,
    ctx: Arc<ServerContext>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), std::io::Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let idle = ctx.config.idle_timeout();

    send_greeting(&mut writer, &ctx).await?;

    let mut session = Session::new();
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        let mut limited = (&mut reader).take(MAX_COMMAND_LINE);
        let read = tokio::select! {
            read = timeout(idle, limited.read_until(b'\n', &mut buffer)) => read,
            _ = wait_for_shutdown(&mut shutdown) => {
                info!("Server shutting down, closing session of {}", session.who());
                break;
            }
        };

        let n = match read {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                info!("Idle timeout for {} after {:?}", session.who(), idle);
                break;
            }
        };

        if n == 0 {
            debug!("Client disconnected");
            break;
        }
        if n as u64 == MAX_COMMAND_LINE && !buffer.ends_with(b"\n") {
            warn!("Command line longer than {} bytes, dropping client", MAX_COMMAND_LINE);
            break;
        }

        // Malformed bytes become U+FFFD; the command is still answered
        let line = String::from_utf8_lossy(&buffer);
        let parsed = match parse_command_line(&line) {
            Some(parsed) => parsed,
            None => continue,
        };
        debug!("Received command from {}: {}", session.who(), parsed.loggable());

        if dispatch_command(&mut writer, &ctx, &mut session, &parsed).await? == Flow::Close {
            break;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Control connection did not shut down cleanly: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_support::TestServer;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::{duplex, DuplexStream, Lines};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;

    struct Client {
        lines: Lines<BufReader<tokio::io::ReadHalf<DuplexStream>>>,
        writer: tokio::io::WriteHalf<DuplexStream>,
    }

    impl Client {
        async fn send(&mut self, line: &str) {
            self.writer
                .write_all(format!("{}\r\n", line).as_bytes())
                .await
                .unwrap();
        }

        async fn reply(&mut self) -> Option<String> {
            self.lines.next_line().await.unwrap()
        }

        async fn command(&mut self, line: &str) -> String {
            self.send(line).await;
            self.reply().await.unwrap()
        }
    }

    fn connect(
        server: TestServer,
    ) -> (Client, JoinHandle<Result<(), std::io::Error>>, watch::Sender<bool>, TempDir) {
        let (dir, ctx) = server.into_parts();
        let (client_end, server_end) = duplex(64 * 1024);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(handle_connection(server_end, Arc::new(ctx), shutdown_rx));

        let (read_half, write_half) = tokio::io::split(client_end);
        let client = Client {
            lines: BufReader::new(read_half).lines(),
            writer: write_half,
        };
        (client, handle, shutdown_tx, dir)
    }

    #[tokio::test]
    async fn test_login_navigate_quit() {
        let (mut client, handle, _shutdown, _server) = connect(TestServer::new());

        assert!(client.reply().await.unwrap().starts_with("220 "));
        assert!(client.command("USER alice").await.starts_with("331 "));
        assert!(client.command("PASS 123456").await.starts_with("230 "));
        assert!(client.command("PWD").await.starts_with("257 \"/\""));
        assert!(client.command("CWD missing").await.starts_with("550 "));
        assert!(client.command("PWD").await.starts_with("257 \"/\""));
        assert_eq!(client.command("QUIT").await, "221 Goodbye.");
        assert_eq!(client.reply().await, None);

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_blank_lines_get_no_reply() {
        let (mut client, _handle, _shutdown, _server) = connect(TestServer::new());
        client.reply().await.unwrap();

        client.send("").await;
        client.send("   ").await;
        assert_eq!(client.command("NOOP").await, "200 NOOP ok.");
    }

    #[tokio::test]
    async fn test_invalid_utf8_keeps_session_alive() {
        let (mut client, _handle, _shutdown, _server) = connect(TestServer::new());
        client.reply().await.unwrap();
        assert!(client.command("USER alice").await.starts_with("331 "));
        assert!(client.command("PASS 123456").await.starts_with("230 "));

        client.writer.write_all(b"CWD caf\xe9\r\n").await.unwrap();
        assert!(client.reply().await.unwrap().starts_with("550 "));
        client.writer.write_all(b"\xff\xfe\r\n").await.unwrap();
        assert!(client.reply().await.unwrap().starts_with("500 Unknown command"));
        assert_eq!(client.command("NOOP").await, "200 NOOP ok.");
    }

    #[tokio::test]
    async fn test_unreachable_data_port_keeps_session_alive() {
        let mut config = Config::default();
        config.server.data_timeout_secs = 1;
        let (mut client, _handle, _shutdown, _server) = connect(TestServer::with_config(config));
        client.reply().await.unwrap();
        client.command("USER alice").await;
        client.command("PASS 123456").await;

        // TEST-NET-1 is never routed: the connect either times out or fails fast
        assert!(client.command("PORT 192,0,2,1,4,1").await.starts_with("200 "));
        assert!(client.command("LIST").await.starts_with("150 "));
        let failed = tokio::time::timeout(Duration::from_secs(5), client.reply())
            .await
            .unwrap()
            .unwrap();
        assert!(failed.starts_with("426 Data connection failed"), "{}", failed);
        assert_eq!(client.command("NOOP").await, "200 NOOP ok.");
        assert_eq!(client.command("LIST").await, "425 Use PORT first.");
    }

    #[tokio::test]
    async fn test_accept_error_backs_off() {
        let started = tokio::time::Instant::now();
        let e = std::io::Error::new(std::io::ErrorKind::Other, "too many open files");
        pause_after_accept_error(&e).await;
        assert!(started.elapsed() >= ACCEPT_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn test_list_over_real_data_port() {
        let (mut client, _handle, _shutdown, _server) = connect(TestServer::new());
        client.reply().await.unwrap();
        client.command("USER alice").await;
        client.command("PASS 123456").await;

        let data = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = data.local_addr().unwrap().port();
        let port_cmd = format!("PORT 127,0,0,1,{},{}", port / 256, port % 256);
        assert!(client.command(&port_cmd).await.starts_with("200 "));

        client.send("LIST").await;
        let (mut socket, _) = data.accept().await.unwrap();
        let mut listing = String::new();
        socket.read_to_string(&mut listing).await.unwrap();

        assert!(client.reply().await.unwrap().starts_with("150 "));
        assert_eq!(client.reply().await.unwrap(), "226 Transfer complete.");
        assert_eq!(listing, "empty/\r\nnotes.txt (11 bytes)\r\npub/\r\n");
        assert_eq!(client.command("LIST").await, "425 Use PORT first.");
    }

    #[tokio::test]
    async fn test_idle_timeout_closes_silently() {
        let mut config = Config::default();
        config.server.idle_timeout_secs = 1;
        let (mut client, handle, _shutdown, _server) = connect(TestServer::with_config(config));
        client.reply().await.unwrap();

        let closed = tokio::time::timeout(Duration::from_secs(5), client.reply())
            .await
            .unwrap();
        assert_eq!(closed, None);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let (mut client, handle, shutdown, _server) = connect(TestServer::new());
        client.reply().await.unwrap();
        client.command("USER alice").await;

        shutdown.send(true).unwrap();
        assert_eq!(client.reply().await, None);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_overlong_line_drops_client() {
        let (mut client, handle, _shutdown, _server) = connect(TestServer::new());
        client.reply().await.unwrap();

        client.send(&"A".repeat(MAX_COMMAND_LINE as usize + 10)).await;
        assert_eq!(client.reply().await, None);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_banner_precedes_greeting() {
        let mut server = TestServer::new();
        server.ctx.banner = vec!["Welcome".to_string(), "Be nice".to_string()];
        let (mut client, _handle, _shutdown, _server) = connect(server);

        assert_eq!(client.reply().await.unwrap(), "220-Welcome");
        assert_eq!(client.reply().await.unwrap(), "220-Be nice");
        assert_eq!(client.reply().await.unwrap(), "220 rouillelite ready.");
    }

    #[tokio::test]
    async fn test_serve_accepts_tcp_clients() {
        let (_dir, ctx) = TestServer::new().into_parts();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let accept_loop = tokio::spawn(serve(listener, Arc::new(ctx), shutdown_rx));

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        assert!(lines.next_line().await.unwrap().unwrap().starts_with("220 "));

        shutdown_tx.send(true).unwrap();
        accept_loop.await.unwrap().unwrap();
        assert_eq!(lines.next_line().await.unwrap(), None);
    }
}
