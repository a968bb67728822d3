//! Pipeline command handler
//!
//! Triggers a run and prints the per-stage report.

use std::path::Path;

use anyhow::{Context, Result};
use aoa_core::domain::outcome::StageOutcome;
use aoa_core::domain::result::OverallStatus;
use aoa_core::dto::start::{StartRequest, StartResponse};
use colored::*;
use serde_json::Value;

use crate::api::ApiClient;

/// Run the pipeline for the request stored at `path`
pub async fn start(client: &ApiClient, path: &Path, demo: bool, test: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read request file: {}", path.display()))?;
    let mut req: StartRequest = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse request file: {}", path.display()))?;

    if demo {
        req.whereareyoufrom = Some("demo".to_string());
    }
    if test {
        req.areyouatest = Some(Value::Bool(true));
    }

    println!("{}", "Running pipeline...".bold());
    let (status, report) = client.start(&req).await?;

    print_report(&report);

    if !status.is_success() {
        anyhow::bail!("Pipeline failed (HTTP {})", status.as_u16());
    }
    Ok(())
}

fn print_report(report: &StartResponse) {
    println!("  Run ID: {}", report.run_id.to_string().cyan());
    println!();

    if let Some(validation) = &report.validation {
        print_outcome("Validation", validation);
    }

    println!("  {} {}", "Imagery".bold(), colorize_status(report.stac.status));
    print_outcome("AOI", &report.stac.aoi);
    print_outcome("Training data", &report.stac.training_data);

    println!("  {} {}", "AOA".bold(), colorize_status(report.aoa.status));
    print_outcome("Model", &report.aoa.training);
    print_outcome("Classification", &report.aoa.classify_and_aoa);

    println!();
    match report.status {
        OverallStatus::Ok => println!("{}", "✓ Pipeline completed successfully!".green().bold()),
        OverallStatus::Error => println!("{}", "✗ Pipeline finished with errors".red().bold()),
    }
}

fn print_outcome(label: &str, outcome: &StageOutcome) {
    println!("    {:<16} {}", label, describe(outcome));
}

fn describe(outcome: &StageOutcome) -> ColoredString {
    match outcome {
        StageOutcome::Ok { summary } => format!("✓ {}", summary).green(),
        StageOutcome::Error { message, code } => format!("✗ {} (code {})", message, code).red(),
        StageOutcome::NotExecuted { reason } => format!("– {}", reason).dimmed(),
    }
}

fn colorize_status(status: OverallStatus) -> ColoredString {
    match status {
        OverallStatus::Ok => "ok".green(),
        OverallStatus::Error => "error".red(),
    }
}
