//! Upload API Handlers
//!
//! Training-data uploads and purging of the uploads directory.

use aoa_core::dto::upload::{
    DeleteFilesRequest, DeleteFilesResponse, UploadRejection, UploadResponse,
};
use axum::{
    Json,
    extract::{Multipart, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::error::{ApiError, ApiResult};
use crate::service::UploadStore;
use crate::state::AppState;

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// POST /upload
/// Store an uploaded file and validate it when it is training data
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut stored = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        stored = Some(state.uploads.save(&file_name, &bytes).await?);
        break;
    }

    let Some(path) = stored else {
        tracing::debug!("Upload request without a file");
        return Ok(Json(UploadResponse { success: false }).into_response());
    };

    if UploadStore::skips_validation(&path) {
        return Ok(Json(UploadResponse { success: true }).into_response());
    }

    let outcome = state.coordinator.validate_training_data(&path).await;
    if outcome.is_ok() {
        tracing::info!("Training data {} accepted", path.display());
        return Ok(Json(UploadResponse { success: true }).into_response());
    }

    tracing::warn!(
        "Training data {} rejected: {}",
        path.display(),
        outcome.message()
    );
    state.uploads.discard(&path).await?;

    Ok((StatusCode::UNAUTHORIZED, Json(UploadRejection::new(outcome))).into_response())
}

/// POST /deleteFiles
/// Delete every upload except the named file
pub async fn delete_files(
    State(state): State<AppState>,
    payload: Result<Json<DeleteFilesRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;
    let reply = match state.uploads.purge(req.file.as_deref()).await {
        Ok(_) => Json(DeleteFilesResponse {
            text: "The files were deleted successfully".to_string(),
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to purge uploads: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "text": "Error while deleting files",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    };
    Ok(reply)
}
