//! Model stage

use std::path::Path;

use aoa_core::domain::call::{ExternalCall, ParamBag, Procedure};
use aoa_core::domain::outcome::StageOutcome;
use aoa_core::domain::request::Algorithm;
use aoa_engine::EngineInvoker;
use serde_json::json;

use super::{bands_value, failure_message, path_value};

pub const UNEXPECTED_CODE: &str = "2";

/// Reason recorded when the user supplied the model
pub const BYPASS_REASON: &str = "bypassed — user-provided model";

/// Inputs of one training call
#[derive(Debug, Clone, Copy)]
pub struct TrainingInputs<'a> {
    pub algorithm: &'a Algorithm,
    pub training_data: &'a Path,
    pub training_image: &'a Path,
    pub bands: &'a [String],
    /// Where the trained model is written
    pub model: &'a Path,
}

impl TrainingInputs<'_> {
    pub fn params(&self) -> ParamBag {
        let mut params = ParamBag::new();
        params.insert("algorithm".into(), json!(self.algorithm.id()));
        params.insert("trainingDataPath".into(), path_value(self.training_data));
        params.insert("trainingImagePath".into(), path_value(self.training_image));
        params.insert(
            "hyperparameter".into(),
            json!(self.algorithm.hyperparameters()),
        );
        params.insert("desiredBands".into(), bands_value(self.bands));
        params.insert("modelPath".into(), path_value(self.model));
        params
    }
}

/// Only `"0"` means a model was written
pub fn outcome(call: &ExternalCall) -> StageOutcome {
    match call.status_code(UNEXPECTED_CODE) {
        "0" => StageOutcome::ok("model trained"),
        code => StageOutcome::error(failure_message("model training failed", call), code),
    }
}

pub fn bypassed() -> StageOutcome {
    StageOutcome::not_executed(BYPASS_REASON)
}

pub async fn train(
    invoker: &EngineInvoker,
    procedure: &Procedure,
    inputs: TrainingInputs<'_>,
) -> StageOutcome {
    let call = invoker.invoke(procedure, inputs.params()).await;
    outcome(&call)
}
