//! API Module
//!
//! HTTP API layer of the server.
//! Each submodule handles endpoints for a specific concern.

pub mod error;
pub mod geojson;
pub mod health;
pub mod start;
pub mod upload;

use aoa_runner::workspace::{
    FURTHER_TRAIN_AREAS_DIR, MODEL_DIR, PREDICTION_DIR, PROCESSED_IMAGES_DIR,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted request body (uploads included)
pub const BODY_LIMIT: usize = 256 * 1024 * 1024;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let config = state.coordinator.config();
    let uploads = config.uploads_dir.clone();
    let output = config.output_dir.clone();

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Pipeline
        .route("/start", post(start::start_pipeline))
        // Uploads
        .route("/upload", post(upload::upload_file))
        .route("/deleteFiles", post(upload::delete_files))
        .route("/getGeoJSON", post(geojson::convert_geopackage))
        // Artifacts (read-only)
        .nest_service("/file", ServeDir::new(&uploads))
        .nest_service("/trainingdata", ServeDir::new(&uploads))
        .nest_service("/model", ServeDir::new(output.join(MODEL_DIR)))
        .nest_service("/predictionaoa", ServeDir::new(output.join(PREDICTION_DIR)))
        .nest_service(
            "/processedsentinelimages",
            ServeDir::new(output.join(PROCESSED_IMAGES_DIR)),
        )
        .nest_service(
            "/furthertrainareas",
            ServeDir::new(output.join(FURTHER_TRAIN_AREAS_DIR)),
        )
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
