//! Infrastructure errors of a pipeline run
//!
//! Engine failures never show up here; they become stage outcomes. These are
//! the filesystem problems that prevent a run from being carried out at all.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to prepare workspace {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stage fixture {path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to publish {path}: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub(crate) fn workspace(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Workspace {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn fixture(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Fixture {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn publish(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Publish {
            path: path.into(),
            source,
        }
    }
}
