//! Service Module
//!
//! File-store logic behind the HTTP handlers.

pub mod uploads;

pub use uploads::{UploadError, UploadStore};
