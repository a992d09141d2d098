use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "rouillelite",
    about = "A sandboxed active-mode FTP server written in Rust."
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory to serve, overrides `root_dir`
    #[arg(short, long)]
    pub root: Option<String>,

    /// Control port, overrides `listen_port`
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a bcrypt hash for a passwd file entry and exit
    #[arg(long, value_name = "PASSWORD")]
    pub hash_password: Option<String>,
}
