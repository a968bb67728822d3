//! Pipeline coordinator
//!
//! Runs the stages of one request strictly in order, each awaited before the
//! next starts:
//! 1. Stage fixtures for demo/test sources
//! 2. Validate training data (train mode only, halts the run on error)
//! 3. Acquire AOI imagery, then training imagery (both attempted)
//! 4. Train a model, or bypass for an uploaded one
//! 5. Classify and compute the area of applicability
//! 6. Publish artifacts and aggregate
//!
//! Engine failures never escape a stage. Only workspace and fixture I/O
//! surface as `PipelineError`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aoa_core::domain::call::ParamBag;
use aoa_core::domain::outcome::StageOutcome;
use aoa_core::domain::request::{Mode, PipelineRequest, Source};
use aoa_core::domain::result::{PipelineResult, Stage, StageOutcomes, aggregate};
use aoa_core::dto::start::StartRequest;
use aoa_core::normalize::{self, NormalizeError, NormalizeSettings};
use aoa_engine::{EngineError, EngineInvoker, ProcedureClient};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::PipelineError;
use crate::fixtures::Fixtures;
use crate::stages::classification::{self, ClassificationInputs};
use crate::stages::model::{self, TrainingInputs};
use crate::stages::{acquisition, validation};
use crate::workspace::Workspace;

const NO_TRAINING_DATA: &str = "no training data in this mode";
const VALIDATION_FAILED: &str = "training data failed validation";
const DEMO_IMAGERY: &str = "bundled demo imagery used";
const ACQUISITION_FAILED: &str = "imagery acquisition failed";
const MODEL_FAILED: &str = "model training failed";

pub struct PipelineCoordinator {
    config: Config,
    settings: NormalizeSettings,
    invoker: EngineInvoker,
    fixtures: Fixtures,
    /// Serializes every write to shared paths (uploads, output directory)
    publish_lock: Mutex<()>,
}

impl PipelineCoordinator {
    pub fn new(config: Config, client: Arc<dyn ProcedureClient>) -> Self {
        Self {
            settings: config.normalize_settings(),
            invoker: EngineInvoker::new(client, config.call_timeout),
            fixtures: Fixtures::new(&config.fixtures_dir),
            publish_lock: Mutex::new(()),
            config,
        }
    }

    /// Coordinator using the engine transport named in `config`
    pub fn from_config(config: Config) -> Self {
        let client = config.build_client();
        Self::new(config, client)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn normalize(&self, raw: &StartRequest) -> Result<PipelineRequest, NormalizeError> {
        normalize::normalize(raw, &self.settings)
    }

    /// Run the training-data validator on its own
    pub async fn validate_training_data(&self, path: &Path) -> StageOutcome {
        validation::validate(
            &self.invoker,
            &self.config.procedures.validate_training_data,
            path,
        )
        .await
    }

    /// Convert an uploaded GeoPackage to GeoJSON for display
    ///
    /// `params` are passed to the engine untouched and the raw reply is
    /// returned.
    pub async fn convert_geopackage(&self, params: &ParamBag) -> Result<Value, EngineError> {
        self.invoker
            .fetch(&self.config.procedures.convert_geopackage, params)
            .await
    }

    /// Execute the full pipeline for one request
    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineResult, PipelineError> {
        let run_id = Uuid::new_v4();
        info!(
            "Starting run {} (mode: {:?}, source: {:?})",
            run_id,
            request.mode.kind(),
            request.source
        );

        let workspace = Workspace::create(&self.config.work_root, run_id).await?;

        let outcomes = match self.execute(request, &workspace).await {
            Ok(outcomes) => {
                let _guard = self.publish_lock.lock().await;
                workspace
                    .publish(&self.config.output_dir)
                    .await
                    .map(|_| outcomes)
            }
            Err(e) => Err(e),
        };

        if self.config.keep_workspaces {
            info!("Keeping workspace {}", workspace.root().display());
        } else if let Err(e) = workspace.remove().await {
            warn!("Failed to remove workspace of run {}: {}", run_id, e);
        }

        let result = aggregate(run_id, request.mode.kind(), request.source, outcomes?);
        info!(
            "Run {} finished with status {:?} ({:?})",
            run_id,
            result.status,
            result.signal()
        );
        Ok(result)
    }

    async fn execute(
        &self,
        request: &PipelineRequest,
        workspace: &Workspace,
    ) -> Result<StageOutcomes, PipelineError> {
        let procedures = &self.config.procedures;
        let artifacts = workspace.artifacts();

        self.stage_fixtures(request.source, workspace).await?;

        let validation = match request.mode.training_data() {
            Some(training_data) => {
                let outcome = self.validate_training_data(training_data).await;
                log_outcome(Stage::Validation, &outcome);
                if outcome.is_error() {
                    let mut outcomes = StageOutcomes::all_not_executed(VALIDATION_FAILED);
                    outcomes.validation = outcome;
                    return Ok(outcomes);
                }
                outcome
            }
            None => StageOutcome::not_executed(NO_TRAINING_DATA),
        };

        let (aoi_imagery, training_imagery) = if request.source.acquires_imagery() {
            let aoi = acquisition::acquire_aoi(
                &self.invoker,
                &procedures.aoi_imagery,
                request,
                &artifacts.aoi_image,
            )
            .await;
            log_outcome(Stage::AoiImagery, &aoi);

            let training = match request.mode.training_data() {
                Some(training_data) => {
                    let outcome = acquisition::acquire_training(
                        &self.invoker,
                        &procedures.training_imagery,
                        request,
                        training_data,
                        &artifacts.training_image,
                    )
                    .await;
                    log_outcome(Stage::TrainingImagery, &outcome);
                    outcome
                }
                None => StageOutcome::not_executed(NO_TRAINING_DATA),
            };
            (aoi, training)
        } else {
            (
                StageOutcome::not_executed(DEMO_IMAGERY),
                StageOutcome::not_executed(DEMO_IMAGERY),
            )
        };

        let acquisition_failed = aoi_imagery.is_error() || training_imagery.is_error();

        let (model, model_path): (StageOutcome, PathBuf) = match &request.mode {
            Mode::UseExistingModel { model: uploaded } => {
                // Demo runs classify with the bundled model staged into the workspace
                let path = match request.source {
                    Source::Demo => artifacts.model.clone(),
                    Source::Live | Source::TestFixture => uploaded.clone(),
                };
                (model::bypassed(), path)
            }
            Mode::TrainFromData { .. } if acquisition_failed => (
                StageOutcome::not_executed(ACQUISITION_FAILED),
                artifacts.model.clone(),
            ),
            Mode::TrainFromData {
                algorithm,
                training_data,
            } => {
                let outcome = model::train(
                    &self.invoker,
                    &procedures.train_model,
                    TrainingInputs {
                        algorithm,
                        training_data,
                        training_image: &artifacts.training_image,
                        bands: &request.bands,
                        model: &artifacts.model,
                    },
                )
                .await;
                log_outcome(Stage::Model, &outcome);
                (outcome, artifacts.model.clone())
            }
        };

        let classification = if acquisition_failed {
            StageOutcome::not_executed(ACQUISITION_FAILED)
        } else if model.is_error() {
            StageOutcome::not_executed(MODEL_FAILED)
        } else {
            let outcome = classification::classify(
                &self.invoker,
                &procedures.classify,
                ClassificationInputs {
                    model: &model_path,
                    bands: &request.bands,
                    aoi_image: &artifacts.aoi_image,
                    output_dir: &artifacts.prediction_dir,
                    further_train_areas_dir: &artifacts.further_train_areas_dir,
                },
            )
            .await;
            log_outcome(Stage::Classification, &outcome);
            outcome
        };

        Ok(StageOutcomes {
            validation,
            aoi_imagery,
            training_imagery,
            model,
            classification,
        })
    }

    async fn stage_fixtures(&self, source: Source, workspace: &Workspace) -> Result<(), PipelineError> {
        match source {
            Source::Live => Ok(()),
            Source::Demo => {
                self.fixtures.stage_demo(workspace).await?;
                let _guard = self.publish_lock.lock().await;
                self.fixtures
                    .stage_demo_model_upload(&self.config.uploads_dir)
                    .await
            }
            Source::TestFixture => {
                let _guard = self.publish_lock.lock().await;
                self.fixtures.stage_test(&self.config.uploads_dir).await
            }
        }
    }
}

fn log_outcome(stage: Stage, outcome: &StageOutcome) {
    match outcome {
        StageOutcome::Ok { summary } => info!("Stage {} ok: {}", stage, summary),
        StageOutcome::Error { message, code } => {
            warn!("Stage {} failed with code {}: {}", stage, code, message)
        }
        StageOutcome::NotExecuted { reason } => info!("Stage {} skipped: {}", stage, reason),
    }
}
