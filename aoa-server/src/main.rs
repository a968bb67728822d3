use anyhow::{Context, Result};
use aoa_runner::{Config, PipelineCoordinator};
use aoa_server::{AppState, create_router};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "aoa_server=debug,aoa_runner=info,aoa_engine=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AOA Server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    for dir in [&config.uploads_dir, &config.work_root, &config.output_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    info!(
        "Loaded configuration: uploads_dir={}, output_dir={}, engine={:?}",
        config.uploads_dir.display(),
        config.output_dir.display(),
        config.engine
    );

    let coordinator = PipelineCoordinator::from_config(config);
    let app = create_router(AppState::new(coordinator));

    // Get bind address
    let addr = std::env::var("AOA_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8781".to_string());

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
