use crate::config::{log_config, Config};
use crate::core_auth::{CredentialStore, PasswdStore};
use crate::core_network::network;
use crate::core_sandbox::PathSandbox;
use crate::session::ServerContext;
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// Loads the optional banner shown before the 220 greeting.
pub fn load_banner(path: &str) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read banner file: {}", path))?;
    Ok(content.lines().map(|line| line.to_string()).collect())
}

/// Builds the shared context: root sandbox, credential store, banner.
pub fn build_context(config: Config) -> Result<ServerContext> {
    let sandbox = PathSandbox::new(&config.server.root_dir)
        .with_context(|| format!("Invalid root directory: {}", config.server.root_dir))?;

    let store = match &config.server.passwd_file {
        Some(path) => PasswdStore::load(Path::new(path))
            .with_context(|| format!("Failed to load passwd file: {}", path))?,
        None => PasswdStore::demo().context("Failed to set up demo accounts")?,
    };
    if store.is_empty() {
        warn!("No accounts configured, every login will be refused");
    } else {
        info!("{} account(s) can log in", store.len());
    }
    let users: Arc<dyn CredentialStore> = Arc::new(store);

    let banner = match &config.server.banner_file {
        Some(path) => match load_banner(path) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("{:#}, continuing without banner", e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    Ok(ServerContext::new(config, sandbox, users, banner))
}

/// Runs the FTP server until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    log_config(&config);
    let ctx = Arc::new(build_context(config)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested, closing all sessions");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    network::start_server(ctx, shutdown_rx).await
}
