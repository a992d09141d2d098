use crate::config::Config;
use crate::core_auth::CredentialStore;
use crate::core_network::DataAddress;
use crate::core_sandbox::{PathSandbox, VirtualPath};
use std::sync::Arc;

/// Everything shared by all sessions. Read-only once the server is up.
pub struct ServerContext {
    pub config: Config,
    pub sandbox: PathSandbox,
    pub users: Arc<dyn CredentialStore>,
    pub banner: Vec<String>,
}

impl ServerContext {
    pub fn new(
        config: Config,
        sandbox: PathSandbox,
        users: Arc<dyn CredentialStore>,
        banner: Vec<String>,
    ) -> Self {
        Self {
            config,
            sandbox,
            users,
            banner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    AwaitingPassword,
    Authenticated,
}

/// Per-connection protocol state, owned by the task serving the connection.
#[derive(Debug)]
pub struct Session {
    pub authenticated: bool,
    pub pending_user: Option<String>, // Set by USER, consumed by PASS
    pub username: Option<String>,     // Account that completed PASS
    pub working_dir: VirtualPath,
    pub pending_data_address: Option<DataAddress>, // One transfer only
}

impl Session {
    pub fn new() -> Self {
        Self {
            authenticated: false,
            pending_user: None,
            username: None,
            working_dir: VirtualPath::root(),
            pending_data_address: None,
        }
    }

    pub fn login_state(&self) -> LoginState {
        if self.authenticated {
            LoginState::Authenticated
        } else if self.pending_user.is_some() {
            LoginState::AwaitingPassword
        } else {
            LoginState::Unauthenticated
        }
    }

    /// Name to show in log lines.
    pub fn who(&self) -> &str {
        self.username
            .as_deref()
            .or(self.pending_user.as_deref())
            .unwrap_or("-")
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
