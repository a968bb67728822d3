//! Bundled inputs for demo and test runs

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::error::PipelineError;
use crate::workspace::Workspace;

pub const DEMO_AOI_IMAGE: &str = "demo/demo_aoi.tif";
pub const DEMO_TRAINING_IMAGE: &str = "demo/demo_trainingData.tif";
pub const DEMO_MODEL: &str = "demo/demo_model.RDS";
pub const TEST_MODEL: &str = "test/model.RDS";
pub const TEST_TRAINING_DATA: &str = "test/trainingsdaten_muenster_32632.gpkg";

/// Name under which staged models land in the uploads directory
pub const UPLOADED_MODEL_NAME: &str = "model.RDS";

/// Fixture directory with `demo/` and `test/` subdirectories
#[derive(Debug, Clone)]
pub struct Fixtures {
    root: PathBuf,
}

impl Fixtures {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Stages the demo imagery and model into the run workspace
    pub async fn stage_demo(&self, workspace: &Workspace) -> Result<(), PipelineError> {
        let artifacts = workspace.artifacts();
        self.copy(DEMO_AOI_IMAGE, &artifacts.aoi_image).await?;
        self.copy(DEMO_TRAINING_IMAGE, &artifacts.training_image)
            .await?;
        self.copy(DEMO_MODEL, &artifacts.model).await?;

        info!("Staged demo inputs into workspace {}", workspace.run_id());
        Ok(())
    }

    /// Makes the demo model available as an upload
    pub async fn stage_demo_model_upload(&self, uploads_dir: &Path) -> Result<(), PipelineError> {
        self.copy(DEMO_MODEL, &uploads_dir.join(UPLOADED_MODEL_NAME))
            .await
    }

    /// Copies the test model and training data into the uploads directory
    pub async fn stage_test(&self, uploads_dir: &Path) -> Result<(), PipelineError> {
        self.copy(TEST_MODEL, &uploads_dir.join(UPLOADED_MODEL_NAME))
            .await?;

        let training_data = Path::new(TEST_TRAINING_DATA);
        if let Some(name) = training_data.file_name() {
            self.copy(TEST_TRAINING_DATA, &uploads_dir.join(name))
                .await?;
        }

        info!("Staged test fixtures into {}", uploads_dir.display());
        Ok(())
    }

    async fn copy(&self, fixture: &str, target: &Path) -> Result<(), PipelineError> {
        let source = self.root.join(fixture);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::fixture(parent, e))?;
        }
        fs::copy(&source, target)
            .await
            .map_err(|e| PipelineError::fixture(&source, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn fixture_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in [
            (DEMO_AOI_IMAGE, "aoi"),
            (DEMO_TRAINING_IMAGE, "training"),
            (DEMO_MODEL, "demo model"),
            (TEST_MODEL, "test model"),
            (TEST_TRAINING_DATA, "polygons"),
        ] {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_stage_demo_into_workspace() {
        let fixtures_dir = fixture_dir();
        let work = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        let workspace = Workspace::create(work.path(), Uuid::new_v4()).await.unwrap();
        let fixtures = Fixtures::new(fixtures_dir.path());

        fixtures.stage_demo(&workspace).await.unwrap();
        fixtures
            .stage_demo_model_upload(uploads.path())
            .await
            .unwrap();

        let artifacts = workspace.artifacts();
        assert_eq!(std::fs::read_to_string(&artifacts.aoi_image).unwrap(), "aoi");
        assert_eq!(
            std::fs::read_to_string(&artifacts.training_image).unwrap(),
            "training"
        );
        assert_eq!(
            std::fs::read_to_string(&artifacts.model).unwrap(),
            "demo model"
        );
        assert_eq!(
            std::fs::read_to_string(uploads.path().join("model.RDS")).unwrap(),
            "demo model"
        );
    }

    #[tokio::test]
    async fn test_stage_test_into_uploads() {
        let fixtures_dir = fixture_dir();
        let uploads = TempDir::new().unwrap();

        Fixtures::new(fixtures_dir.path())
            .stage_test(uploads.path())
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(uploads.path().join("model.RDS")).unwrap(),
            "test model"
        );
        assert_eq!(
            std::fs::read_to_string(uploads.path().join("trainingsdaten_muenster_32632.gpkg"))
                .unwrap(),
            "polygons"
        );
    }

    #[tokio::test]
    async fn test_missing_fixture_is_reported() {
        let empty = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();

        let err = Fixtures::new(empty.path())
            .stage_test(uploads.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Fixture { .. }));
    }
}
