mod config;
mod constants;
mod core_auth;
mod core_cli;
mod core_ftpcommand;
mod core_network;
mod core_sandbox;
mod helpers;
mod server;
mod session;
#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::core_auth::helper::hash_password;
use crate::core_cli::Cli;
use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use std::io::Write;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "etc/rouillelite.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format; RUST_LOG still wins
    let default_level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    if let Some(password) = args.hash_password.as_deref() {
        println!("{}", hash_password(password, bcrypt::DEFAULT_COST)?);
        return Ok(());
    }

    let mut config = load_config(args.config.as_deref())?;

    // CLI overrides
    if let Some(root) = args.root {
        config.server.root_dir = root;
    }
    if let Some(port) = args.port {
        config.server.listen_port = port;
    }
    config.validate()?;

    server::run(config).await
}

/// An explicit `--config` must exist. Without one the default path is
/// tried and built-in defaults are used if it is absent.
fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load_from_file(DEFAULT_CONFIG_PATH)
        }
        None => {
            info!("No configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}
