//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipeline;
mod uploads;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::api::ApiClient;
use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline for a request file
    Start {
        /// Path to the JSON request (the body of POST /start)
        #[arg(short, long)]
        request: PathBuf,

        /// Use the bundled demo imagery and model
        #[arg(long)]
        demo: bool,

        /// Use the bundled test model and training data
        #[arg(long)]
        test: bool,
    },
    /// Upload training data (validated) or a model
    Upload {
        /// File to upload
        path: PathBuf,
    },
    /// Delete every upload except one file
    DeleteFiles {
        /// Upload to keep
        #[arg(short, long)]
        keep: Option<String>,
    },
    /// Check that the server is up
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = ApiClient::new(&config.server_url);

    match command {
        Commands::Start {
            request,
            demo,
            test,
        } => pipeline::start(&client, &request, demo, test).await,
        Commands::Upload { path } => uploads::upload(&client, &path).await,
        Commands::DeleteFiles { keep } => uploads::delete_files(&client, keep).await,
        Commands::Health => {
            let reply = client.health().await?;
            println!("{} {}", "✓".green().bold(), reply);
            Ok(())
        }
    }
}
