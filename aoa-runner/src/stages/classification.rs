//! Classification and area-of-applicability stage

use std::path::Path;

use aoa_core::domain::call::{ExternalCall, ParamBag, Procedure};
use aoa_core::domain::outcome::StageOutcome;
use aoa_engine::EngineInvoker;

use super::{bands_value, failure_message, path_value};

pub const UNEXPECTED_CODE: &str = "2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationCode {
    Classified,
    /// Only meaningful for uploaded models
    MissingPredictors,
    Unexpected,
}

impl ClassificationCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => Self::Classified,
            "1" => Self::MissingPredictors,
            _ => Self::Unexpected,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Classified => "prediction and AOA computed",
            Self::MissingPredictors => "model predictors absent from the imagery",
            Self::Unexpected => "unexpected failure",
        }
    }
}

pub fn outcome(call: &ExternalCall) -> StageOutcome {
    let code = call.status_code(UNEXPECTED_CODE);
    match ClassificationCode::from_code(code) {
        ClassificationCode::Classified => {
            StageOutcome::ok(ClassificationCode::Classified.message())
        }
        other => StageOutcome::error(failure_message(other.message(), call), code),
    }
}

/// Inputs of one classification call
#[derive(Debug, Clone, Copy)]
pub struct ClassificationInputs<'a> {
    pub model: &'a Path,
    pub bands: &'a [String],
    pub aoi_image: &'a Path,
    pub output_dir: &'a Path,
    pub further_train_areas_dir: &'a Path,
}

impl ClassificationInputs<'_> {
    pub fn params(&self) -> ParamBag {
        let mut params = ParamBag::new();
        params.insert("modelPath".into(), path_value(self.model));
        params.insert("desiredBands".into(), bands_value(self.bands));
        params.insert("aoiImagePath".into(), path_value(self.aoi_image));
        params.insert("outputDirectory".into(), path_value(self.output_dir));
        params.insert(
            "furtherTrainAreasDirectory".into(),
            path_value(self.further_train_areas_dir),
        );
        params
    }
}

pub async fn classify(
    invoker: &EngineInvoker,
    procedure: &Procedure,
    inputs: ClassificationInputs<'_>,
) -> StageOutcome {
    let call = invoker.invoke(procedure, inputs.params()).await;
    outcome(&call)
}
