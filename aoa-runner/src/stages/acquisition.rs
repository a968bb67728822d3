//! Imagery acquisition
//!
//! AOI imagery and training-data imagery share one code table.

use std::path::Path;

use aoa_core::domain::call::{ExternalCall, ParamBag, Procedure};
use aoa_core::domain::outcome::StageOutcome;
use aoa_core::domain::request::PipelineRequest;
use aoa_engine::EngineInvoker;
use serde_json::{Value, json};

use super::{bands_value, failure_message, path_value};

pub const UNEXPECTED_CODE: &str = "2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionCode {
    Created,
    NoItems,
    NoItemsAfterCloudFilter,
    Unexpected,
}

impl AcquisitionCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => Self::Created,
            "1" => Self::NoItems,
            "3" => Self::NoItemsAfterCloudFilter,
            _ => Self::Unexpected,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Created => "imagery created",
            Self::NoItems => "no matching items for date range/location",
            Self::NoItemsAfterCloudFilter => "no matching items after cloud-coverage filtering",
            Self::Unexpected => "unexpected failure",
        }
    }
}

pub fn outcome(call: &ExternalCall) -> StageOutcome {
    let code = call.status_code(UNEXPECTED_CODE);
    match AcquisitionCode::from_code(code) {
        AcquisitionCode::Created => StageOutcome::ok(AcquisitionCode::Created.message()),
        other => StageOutcome::error(failure_message(other.message(), call), code),
    }
}

/// Parameters shared by both acquisitions
fn query_params(request: &PipelineRequest, output: &Path) -> ParamBag {
    let mut params = ParamBag::new();
    params.insert("datetime".into(), json!(request.dates.to_range_string()));
    params.insert("limit".into(), json!(request.item_limit));
    params.insert("desiredBands".into(), bands_value(&request.bands));
    params.insert("resolution".into(), json!(request.resolution));
    params.insert(
        "cloudCoverageInPercentage".into(),
        json!(request.cloud_coverage),
    );
    params.insert("outputPath".into(), path_value(output));
    params
}

pub fn aoi_params(request: &PipelineRequest, output: &Path) -> ParamBag {
    let mut params = query_params(request, output);
    let bottom_left = request.bbox.bottom_left();
    let top_right = request.bbox.top_right();
    params.insert("bottomLeftX".into(), Value::from(bottom_left.lng));
    params.insert("bottomLeftY".into(), Value::from(bottom_left.lat));
    params.insert("topRightX".into(), Value::from(top_right.lng));
    params.insert("topRightY".into(), Value::from(top_right.lat));
    params
}

pub fn training_params(request: &PipelineRequest, training_data: &Path, output: &Path) -> ParamBag {
    let mut params = query_params(request, output);
    params.insert("trainingDataPath".into(), path_value(training_data));
    params
}

/// Fetch imagery covering the bounding box into `output`
pub async fn acquire_aoi(
    invoker: &EngineInvoker,
    procedure: &Procedure,
    request: &PipelineRequest,
    output: &Path,
) -> StageOutcome {
    let call = invoker.invoke(procedure, aoi_params(request, output)).await;
    outcome(&call)
}

/// Fetch imagery covering the training polygons into `output`
pub async fn acquire_training(
    invoker: &EngineInvoker,
    procedure: &Procedure,
    request: &PipelineRequest,
    training_data: &Path,
    output: &Path,
) -> StageOutcome {
    let call = invoker
        .invoke(procedure, training_params(request, training_data, output))
        .await;
    outcome(&call)
}
