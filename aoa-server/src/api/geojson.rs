//! GeoPackage Preview Handler

use aoa_core::domain::call::ParamBag;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /getGeoJSON
/// Convert an uploaded GeoPackage so the browser can draw it
///
/// The body goes to the engine as the argument object and its reply is
/// returned unchanged.
pub async fn convert_geopackage(
    State(state): State<AppState>,
    payload: Result<Json<ParamBag>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(params) = payload?;

    match state.coordinator.convert_geopackage(&params).await {
        Ok(geojson) => Ok(Json(geojson)),
        Err(e) => {
            tracing::warn!("GeoPackage conversion failed: {}", e);
            Err(ApiError::BadRequest(e.to_string()))
        }
    }
}
