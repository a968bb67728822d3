//! Pipeline Trigger Handler

use aoa_core::domain::result::PipelineSignal;
use aoa_core::dto::start::{StartRequest, StartResponse};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /start
/// Run the whole pipeline for one request and report every stage
///
/// The body is the same whatever the status code; the code tells the
/// browser which group of stages to look at.
pub async fn start_pipeline(
    State(state): State<AppState>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StartResponse>)> {
    let Json(req) = payload?;
    let request = state
        .coordinator
        .normalize(&req)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        "Starting pipeline: mode={:?}, source={:?}, dates={}",
        request.mode.kind(),
        request.source,
        request.dates
    );

    let result = state.coordinator.run(&request).await?;

    Ok((
        status_for(result.signal()),
        Json(StartResponse::from(&result)),
    ))
}

/// Status code the browser client branches on
pub fn status_for(signal: PipelineSignal) -> StatusCode {
    match signal {
        PipelineSignal::Completed => StatusCode::OK,
        PipelineSignal::ValidationFailed => StatusCode::UNAUTHORIZED,
        PipelineSignal::AcquisitionFailed => StatusCode::PAYMENT_REQUIRED,
        PipelineSignal::ComputationFailed => StatusCode::FORBIDDEN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(status_for(PipelineSignal::Completed).as_u16(), 200);
        assert_eq!(status_for(PipelineSignal::ValidationFailed).as_u16(), 401);
        assert_eq!(status_for(PipelineSignal::AcquisitionFailed).as_u16(), 402);
        assert_eq!(status_for(PipelineSignal::ComputationFailed).as_u16(), 403);
    }
}
