//! CLI interface for tickstream
//!
//! Provides subcommands for:
//! - `stream`: Subscribe to symbols and print live trades
//! - `config`: Show the resolved configuration

mod stream;

pub use stream::StreamArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tickstream")]
#[command(about = "Real-time market data streaming client with automatic reconnection")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Feed access token (overrides config file and environment)
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Subscribe to symbols and print live trades
    Stream(StreamArgs),
    /// Show the resolved configuration
    Config,
}
