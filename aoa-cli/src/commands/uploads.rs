//! Upload command handlers

use std::path::Path;

use anyhow::Result;
use colored::*;

use crate::api::{ApiClient, UploadReply};

/// Upload one file and report whether the server kept it
pub async fn upload(client: &ApiClient, path: &Path) -> Result<()> {
    match client.upload(path).await? {
        UploadReply::Accepted(reply) if reply.success => {
            println!("{}", "✓ File uploaded successfully!".green().bold());
            Ok(())
        }
        UploadReply::Accepted(_) => anyhow::bail!("Server did not receive a file"),
        UploadReply::Rejected(rejection) => {
            println!("{}", format!("✗ {}", rejection.message).red().bold());
            println!(
                "  Validator: {} (code {})",
                rejection.error.message(),
                rejection.error.code().unwrap_or("-")
            );
            anyhow::bail!("Upload rejected")
        }
    }
}

/// Purge the uploads directory
pub async fn delete_files(client: &ApiClient, keep: Option<String>) -> Result<()> {
    if let Some(keep) = &keep {
        println!("Keeping {}", keep.cyan());
    }
    let reply = client.delete_files(keep).await?;
    println!("{}", format!("✓ {}", reply.text).green().bold());
    Ok(())
}
