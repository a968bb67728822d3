//! AOA Server
//!
//! HTTP front of the pipeline: triggers runs, accepts training-data uploads
//! and serves the published artifacts.

pub mod api;
pub mod service;
pub mod state;

pub use api::create_router;
pub use state::AppState;
