//! Per-run workspace
//!
//! Every run writes into `<work_root>/<run id>` and hands artifact paths from
//! stage to stage in memory. Only `publish` touches the shared output
//! directory, and the coordinator calls it under its publication lock.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::PipelineError;

pub const PROCESSED_IMAGES_DIR: &str = "processed_sentinel_images";
pub const MODEL_DIR: &str = "model";
pub const PREDICTION_DIR: &str = "prediction_and_aoa";
pub const FURTHER_TRAIN_AREAS_DIR: &str = "further_train_areas";

/// Directories that are published after a run
pub const PUBLISHED_DIRS: [&str; 4] = [
    PROCESSED_IMAGES_DIR,
    MODEL_DIR,
    PREDICTION_DIR,
    FURTHER_TRAIN_AREAS_DIR,
];

/// Where a run's stages read and write their artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub aoi_image: PathBuf,
    pub training_image: PathBuf,
    pub model: PathBuf,
    pub prediction_dir: PathBuf,
    pub further_train_areas_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn under(root: &Path) -> Self {
        let images = root.join(PROCESSED_IMAGES_DIR);
        Self {
            aoi_image: images.join("aoi.tif"),
            training_image: images.join("trainingData.tif"),
            model: root.join(MODEL_DIR).join("model.RDS"),
            prediction_dir: root.join(PREDICTION_DIR),
            further_train_areas_dir: root.join(FURTHER_TRAIN_AREAS_DIR),
        }
    }
}

/// Private directory of one pipeline run
#[derive(Debug)]
pub struct Workspace {
    run_id: Uuid,
    root: PathBuf,
    artifacts: ArtifactPaths,
}

impl Workspace {
    /// Creates the workspace directory tree for `run_id`
    pub async fn create(work_root: &Path, run_id: Uuid) -> Result<Self, PipelineError> {
        let root = work_root.join(run_id.to_string());

        for dir in PUBLISHED_DIRS {
            let path = root.join(dir);
            fs::create_dir_all(&path)
                .await
                .map_err(|e| PipelineError::workspace(&path, e))?;
        }

        debug!("Created workspace {}", root.display());

        Ok(Self {
            run_id,
            artifacts: ArtifactPaths::under(&root),
            root,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifacts(&self) -> &ArtifactPaths {
        &self.artifacts
    }

    /// Copies everything the run produced into `output_dir`
    ///
    /// Files keep their path relative to the workspace root and overwrite
    /// whatever an earlier run published there. Returns the published paths.
    pub async fn publish(&self, output_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let mut published = Vec::new();
        let mut pending: Vec<PathBuf> = PUBLISHED_DIRS.iter().map(PathBuf::from).collect();

        while let Some(relative) = pending.pop() {
            let source_dir = self.root.join(&relative);
            let target_dir = output_dir.join(&relative);
            fs::create_dir_all(&target_dir)
                .await
                .map_err(|e| PipelineError::publish(&target_dir, e))?;

            let mut entries = fs::read_dir(&source_dir)
                .await
                .map_err(|e| PipelineError::publish(&source_dir, e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| PipelineError::publish(&source_dir, e))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| PipelineError::publish(entry.path(), e))?;

                if file_type.is_dir() {
                    pending.push(relative.join(entry.file_name()));
                } else if file_type.is_file() {
                    let target = target_dir.join(entry.file_name());
                    fs::copy(entry.path(), &target)
                        .await
                        .map_err(|e| PipelineError::publish(&target, e))?;
                    published.push(target);
                }
            }
        }

        info!(
            "Published {} artifact(s) of run {} to {}",
            published.len(),
            self.run_id,
            output_dir.display()
        );
        Ok(published)
    }

    /// Deletes the workspace directory tree
    pub async fn remove(self) -> Result<(), PipelineError> {
        fs::remove_dir_all(&self.root)
            .await
            .map_err(|e| PipelineError::workspace(&self.root, e))?;
        debug!("Removed workspace {}", self.root.display());
        Ok(())
    }
}
