use std::sync::Arc;

use aoa_runner::PipelineCoordinator;

use crate::service::UploadStore;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<PipelineCoordinator>,
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    pub fn new(coordinator: PipelineCoordinator) -> Self {
        let uploads = UploadStore::new(&coordinator.config().uploads_dir);
        Self {
            coordinator: Arc::new(coordinator),
            uploads: Arc::new(uploads),
        }
    }
}
