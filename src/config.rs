use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub listen_port: u16,
    pub root_dir: String,
    pub passwd_file: Option<String>, // user:bcrypt_hash lines
    pub banner_file: Option<String>, // Extra 220- lines before the greeting
    pub greeting: String,
    pub max_connections: usize,
    pub idle_timeout_secs: u64,
    pub data_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: String::from("0.0.0.0"),
            listen_port: 2121,
            root_dir: String::from("data"),
            passwd_file: None,
            banner_file: None,
            greeting: String::from("rouillelite ready."),
            max_connections: 32,
            idle_timeout_secs: 300,
            data_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let config = Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?;
        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if server.max_connections == 0 {
            bail!("max_connections must be at least 1");
        }
        if server.idle_timeout_secs == 0 || server.data_timeout_secs == 0 {
            bail!("idle_timeout_secs and data_timeout_secs must be non-zero");
        }
        if server.data_timeout_secs >= server.idle_timeout_secs {
            warn!(
                "data_timeout_secs ({}) is not shorter than idle_timeout_secs ({})",
                server.data_timeout_secs, server.idle_timeout_secs
            );
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.server.idle_timeout_secs)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.server.data_timeout_secs)
    }
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    let server = &config.server;
    info!("  Listen Address: {}:{}", server.listen_address, server.listen_port);
    info!("  Root Directory: {}", server.root_dir);
    info!(
        "  Passwd File: {}",
        server.passwd_file.as_deref().unwrap_or("(built-in demo accounts)")
    );
    info!("  Max Connections: {}", server.max_connections);
    info!("  Idle Timeout: {}s", server.idle_timeout_secs);
    info!("  Data Timeout: {}s", server.data_timeout_secs);
}
