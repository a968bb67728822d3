//! Pipeline result and aggregation
//!
//! Everything in here is pure: the aggregator only classifies outcomes that
//! the runner already produced.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::outcome::StageOutcome;
use super::request::{ModeKind, Source};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    AoiImagery,
    TrainingImagery,
    Model,
    Classification,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Validation,
        Stage::AoiImagery,
        Stage::TrainingImagery,
        Stage::Model,
        Stage::Classification,
    ];

    /// Whether this stage must end `ok` for the run to succeed
    pub fn is_required(self, mode: ModeKind, source: Source) -> bool {
        let training = mode == ModeKind::TrainFromData;
        match self {
            Stage::Validation => training,
            Stage::AoiImagery => source.acquires_imagery(),
            Stage::TrainingImagery => training && source.acquires_imagery(),
            Stage::Model => training,
            Stage::Classification => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::AoiImagery => "aoi_imagery",
            Stage::TrainingImagery => "training_imagery",
            Stage::Model => "model",
            Stage::Classification => "classification",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outcome per stage, as produced by the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcomes {
    pub validation: StageOutcome,
    pub aoi_imagery: StageOutcome,
    pub training_imagery: StageOutcome,
    pub model: StageOutcome,
    pub classification: StageOutcome,
}

impl StageOutcomes {
    /// Every stage marked `not_executed` with the same reason
    pub fn all_not_executed(reason: &str) -> Self {
        Self {
            validation: StageOutcome::not_executed(reason),
            aoi_imagery: StageOutcome::not_executed(reason),
            training_imagery: StageOutcome::not_executed(reason),
            model: StageOutcome::not_executed(reason),
            classification: StageOutcome::not_executed(reason),
        }
    }

    pub fn get(&self, stage: Stage) -> &StageOutcome {
        match stage {
            Stage::Validation => &self.validation,
            Stage::AoiImagery => &self.aoi_imagery,
            Stage::TrainingImagery => &self.training_imagery,
            Stage::Model => &self.model,
            Stage::Classification => &self.classification,
        }
    }
}

/// Overall status of a run or of a group of stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Ok,
    Error,
}

impl OverallStatus {
    fn from_bool(ok: bool) -> Self {
        if ok { Self::Ok } else { Self::Error }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

/// Caller-visible classification of a finished run
///
/// The HTTP collaborator maps these onto 200/401/402/403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineSignal {
    Completed,
    ValidationFailed,
    AcquisitionFailed,
    ComputationFailed,
}

/// Aggregated result of one pipeline execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub mode: ModeKind,
    pub source: Source,
    pub outcomes: StageOutcomes,
    pub status: OverallStatus,
}

/// Combine stage outcomes into a `PipelineResult`
///
/// Overall status is `ok` iff every stage required by `mode` and `source`
/// is `ok` and no stage reported an error.
pub fn aggregate(
    run_id: Uuid,
    mode: ModeKind,
    source: Source,
    outcomes: StageOutcomes,
) -> PipelineResult {
    let ok = Stage::ALL
        .iter()
        .all(|stage| acceptable(*stage, mode, source, outcomes.get(*stage)));

    PipelineResult {
        run_id,
        mode,
        source,
        outcomes,
        status: OverallStatus::from_bool(ok),
    }
}

fn acceptable(stage: Stage, mode: ModeKind, source: Source, outcome: &StageOutcome) -> bool {
    if stage.is_required(mode, source) {
        outcome.is_ok()
    } else {
        !outcome.is_error()
    }
}

impl PipelineResult {
    pub fn outcome(&self, stage: Stage) -> &StageOutcome {
        self.outcomes.get(stage)
    }

    /// Stages paired with their outcomes, in execution order
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageOutcome)> {
        Stage::ALL
            .into_iter()
            .map(move |stage| (stage, self.outcomes.get(stage)))
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Status of the imagery acquisition group
    pub fn stac_status(&self) -> OverallStatus {
        self.group_status(&[Stage::AoiImagery, Stage::TrainingImagery])
    }

    /// Status of the model and classification group
    pub fn aoa_status(&self) -> OverallStatus {
        self.group_status(&[Stage::Model, Stage::Classification])
    }

    fn group_status(&self, stages: &[Stage]) -> OverallStatus {
        OverallStatus::from_bool(
            stages
                .iter()
                .all(|stage| acceptable(*stage, self.mode, self.source, self.outcome(*stage))),
        )
    }

    /// First failing stage group decides the signal
    pub fn signal(&self) -> PipelineSignal {
        if self.outcomes.validation.is_error() {
            PipelineSignal::ValidationFailed
        } else if self.outcomes.aoi_imagery.is_error() || self.outcomes.training_imagery.is_error() {
            PipelineSignal::AcquisitionFailed
        } else if self.is_ok() {
            PipelineSignal::Completed
        } else {
            PipelineSignal::ComputationFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok() -> StageOutcome {
        StageOutcome::ok("done")
    }

    fn all_ok() -> StageOutcomes {
        StageOutcomes {
            validation: ok(),
            aoi_imagery: ok(),
            training_imagery: ok(),
            model: ok(),
            classification: ok(),
        }
    }

    fn run(mode: ModeKind, source: Source, outcomes: StageOutcomes) -> PipelineResult {
        aggregate(Uuid::new_v4(), mode, source, outcomes)
    }

    #[test]
    fn test_train_run_all_ok() {
        let result = run(ModeKind::TrainFromData, Source::Live, all_ok());
        assert!(result.is_ok());
        assert_eq!(result.stac_status(), OverallStatus::Ok);
        assert_eq!(result.aoa_status(), OverallStatus::Ok);
        assert_eq!(result.signal(), PipelineSignal::Completed);
    }

    #[test]
    fn test_bypassed_model_does_not_block_success() {
        let outcomes = StageOutcomes {
            validation: StageOutcome::not_executed("no training data"),
            training_imagery: StageOutcome::not_executed("no training data"),
            model: StageOutcome::not_executed("bypassed"),
            ..all_ok()
        };

        let result = run(ModeKind::UseExistingModel, Source::Live, outcomes);
        assert!(result.is_ok());
        assert_eq!(result.signal(), PipelineSignal::Completed);
    }

    #[test]
    fn test_required_stage_not_executed_blocks_success() {
        let outcomes = StageOutcomes {
            model: StageOutcome::not_executed("skipped"),
            ..all_ok()
        };

        let result = run(ModeKind::TrainFromData, Source::Live, outcomes);
        assert!(!result.is_ok());
        assert_eq!(result.aoa_status(), OverallStatus::Error);
        assert_eq!(result.signal(), PipelineSignal::ComputationFailed);
    }

    #[test]
    fn test_demo_run_does_not_require_acquisition() {
        let outcomes = StageOutcomes {
            aoi_imagery: StageOutcome::not_executed("demo imagery"),
            training_imagery: StageOutcome::not_executed("demo imagery"),
            ..all_ok()
        };

        let result = run(ModeKind::TrainFromData, Source::Demo, outcomes);
        assert!(result.is_ok());
        assert_eq!(result.stac_status(), OverallStatus::Ok);
    }

    #[test]
    fn test_acquisition_error_signal() {
        let outcomes = StageOutcomes {
            aoi_imagery: StageOutcome::error("no matching items", "1"),
            model: StageOutcome::not_executed("upstream failure"),
            classification: StageOutcome::not_executed("upstream failure"),
            ..all_ok()
        };

        let result = run(ModeKind::TrainFromData, Source::Live, outcomes);
        assert!(!result.is_ok());
        assert_eq!(result.stac_status(), OverallStatus::Error);
        assert_eq!(result.signal(), PipelineSignal::AcquisitionFailed);
    }

    #[test]
    fn test_validation_error_takes_precedence() {
        let mut outcomes = StageOutcomes::all_not_executed("validation failed");
        outcomes.validation = StageOutcome::error("missing required label column", "1");

        let result = run(ModeKind::TrainFromData, Source::Live, outcomes);
        assert_eq!(result.signal(), PipelineSignal::ValidationFailed);
    }

    #[test]
    fn test_error_in_optional_stage_forces_error() {
        let outcomes = StageOutcomes {
            validation: StageOutcome::not_executed("no training data"),
            training_imagery: StageOutcome::error("unexpected failure", "2"),
            model: StageOutcome::not_executed("bypassed"),
            ..all_ok()
        };

        let result = run(ModeKind::UseExistingModel, Source::Live, outcomes);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_iter_follows_stage_order() {
        let result = run(ModeKind::TrainFromData, Source::Live, all_ok());
        let stages: Vec<Stage> = result.iter().map(|(stage, _)| stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
    }
}
