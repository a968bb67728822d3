//! Pipeline stages
//!
//! Each stage owns its code table and turns one [`ExternalCall`] into a
//! [`StageOutcome`]. Code values are never compared across stages.
//!
//! [`StageOutcome`]: aoa_core::domain::outcome::StageOutcome

pub mod acquisition;
pub mod classification;
pub mod model;
pub mod validation;

use std::path::Path;

use aoa_core::domain::call::ExternalCall;
use serde_json::Value;

/// Error message for a failed call, carrying the transport reason if any
fn failure_message(message: &str, call: &ExternalCall) -> String {
    match call.failure_reason() {
        Some(reason) => format!("{}: {}", message, reason),
        None => message.to_string(),
    }
}

fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}

fn bands_value(bands: &[String]) -> Value {
    Value::Array(bands.iter().cloned().map(Value::String).collect())
}
