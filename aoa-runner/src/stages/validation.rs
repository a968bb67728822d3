//! Training-data validator
//!
//! Shared by the upload handler and the first pipeline stage.

use std::path::Path;

use aoa_core::domain::call::{ExternalCall, ParamBag, Procedure};
use aoa_core::domain::outcome::StageOutcome;
use aoa_engine::EngineInvoker;

use super::{failure_message, path_value};

/// Code recorded when the validator could not be called at all
pub const UNEXPECTED_CODE: &str = "error";

/// Codes returned by the validation procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    Valid,
    MissingLabelColumn,
    EmptyLabel,
    NotPolygon,
    Unexpected,
}

impl ValidationCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => Self::Valid,
            "1" => Self::MissingLabelColumn,
            "2" => Self::EmptyLabel,
            "3" => Self::NotPolygon,
            _ => Self::Unexpected,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Valid => "training data is valid",
            Self::MissingLabelColumn => "missing required label column",
            Self::EmptyLabel => "a label value is empty",
            Self::NotPolygon => "geometry type is not polygon",
            Self::Unexpected => "unexpected validation failure",
        }
    }
}

pub fn outcome(call: &ExternalCall) -> StageOutcome {
    let code = call.status_code(UNEXPECTED_CODE);
    match ValidationCode::from_code(code) {
        ValidationCode::Valid => StageOutcome::ok(ValidationCode::Valid.message()),
        other => StageOutcome::error(failure_message(other.message(), call), code),
    }
}

/// Validate an uploaded training-data file
pub async fn validate(
    invoker: &EngineInvoker,
    procedure: &Procedure,
    training_data: &Path,
) -> StageOutcome {
    let mut params = ParamBag::new();
    params.insert("path".to_string(), path_value(training_data));

    let call = invoker.invoke(procedure, params).await;
    outcome(&call)
}
