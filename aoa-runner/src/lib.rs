//! AOA Runner
//!
//! Executes area-of-applicability pipelines against the computation engine.
//!
//! Architecture:
//! - Configuration: file locations, engine transport, procedures, defaults
//! - Stages: one module per stage, each with its own code table
//! - Workspace: private per-run directory, published to shared paths at the end
//! - Fixtures: bundled inputs for demo and test runs
//! - Coordinator: sequences the stages and aggregates their outcomes

pub mod config;
pub mod error;
pub mod fixtures;
pub mod pipeline;
pub mod stages;
pub mod workspace;

pub use config::{Config, EngineSettings, ProcedureCatalog};
pub use error::PipelineError;
pub use pipeline::PipelineCoordinator;
