// Fixtures shared by the handler and connection tests
use crate::config::Config;
use crate::core_auth::PasswdStore;
use crate::core_network::DataAddress;
use crate::core_sandbox::PathSandbox;
use crate::session::{ServerContext, Session};
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct TestServer {
    _dir: TempDir,
    pub ctx: ServerContext,
}

impl TestServer {
    /// Root layout:
    /// `/notes.txt` (11 bytes), `/pub/readme.txt` (5 bytes), `/pub/docs/`, `/empty/`
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello world").unwrap();
        fs::create_dir_all(dir.path().join("pub/docs")).unwrap();
        fs::write(dir.path().join("pub/readme.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        config.server.root_dir = dir.path().to_string_lossy().into_owned();
        let sandbox = PathSandbox::new(dir.path()).unwrap();
        let users =
            PasswdStore::from_plain(&[("alice", "123456"), ("bob", "abcdef")], 4).unwrap();

        Self {
            _dir: dir,
            ctx: ServerContext::new(config, sandbox, Arc::new(users), Vec::new()),
        }
    }

    /// Hands out the context; the directory must outlive it.
    pub fn into_parts(self) -> (TempDir, ServerContext) {
        (self._dir, self.ctx)
    }

    pub fn root(&self) -> &Path {
        self.ctx.sandbox.root()
    }

    pub fn logged_in_session(&self) -> Session {
        let mut session = Session::new();
        session.authenticated = true;
        session.username = Some("alice".to_string());
        session
    }
}

/// Splits captured control output into reply lines.
pub fn replies(out: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(out)
        .split("\r\n")
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A client data port that records everything the server sends.
pub async fn data_receiver() -> (DataAddress, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.unwrap();
        received
    });
    (DataAddress::new(Ipv4Addr::LOCALHOST, port), handle)
}

/// A client data port that uploads `payload` and then closes.
pub async fn data_sender(payload: Vec<u8>) -> (DataAddress, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(&payload).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    (DataAddress::new(Ipv4Addr::LOCALHOST, port), handle)
}
