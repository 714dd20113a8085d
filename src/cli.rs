//! Command-line flags. Anything set here wins over config.toml.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "suptech-champions")]
#[command(about = "SupTech Champions: A Data Heist Simulation")]
#[command(version)]
pub struct Cli {
    /// Read this config file instead of searching for config.toml
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Seed for answer and violation shuffles (reproducible runs)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start with sound off (F9 toggles in game)
    #[arg(long)]
    pub mute: bool,

    /// Log filter, e.g. "debug" or "suptech_champions=trace"
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}
