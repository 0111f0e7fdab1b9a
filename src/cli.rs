use clap::Parser;
use std::path::PathBuf;

/// Multi-agent chat service: a supervisor model routing to research, vision and document workers
#[derive(Parser, Debug, Clone)]
#[command(name = "aide", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "AIDE_CONFIG", default_value = "aide.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "AIDE_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "AIDE_PORT")]
    pub port: Option<u16>,

    /// Dotenv file loaded before credentials are read (default: ./.env if present)
    #[arg(long, env = "AIDE_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}
