//! AOA CLI
//!
//! Command-line interface for the AOA server: trigger pipeline runs, upload
//! training data and manage the uploads directory.

mod api;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "aoa")]
#[command(about = "Area of applicability pipeline CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "AOA_SERVER_URL", default_value = "http://localhost:8781")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
    };

    handle_command(cli.command, &config).await
}
