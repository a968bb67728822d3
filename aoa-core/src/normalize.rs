//! Request normalizer
//!
//! Turns the loosely-typed [`StartRequest`] into a canonical
//! [`PipelineRequest`]. Nothing here touches the filesystem: file references
//! are only checked for shape and resolved against the uploads directory.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::domain::request::{
    Algorithm, BoundingBox, Coordinate, DateRange, Mode, PipelineRequest, Source,
};
use crate::dto::start::StartRequest;

/// Values the normalizer falls back on or appends
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeSettings {
    /// Band always present in the final band list
    pub cloud_mask_band: String,
    /// Bands used when the request names none
    pub default_bands: Vec<String>,
    /// Cloud coverage used when the request gives none
    pub default_cloud_coverage: f64,
    /// Maximum number of STAC items per acquisition
    pub item_limit: u32,
    /// Directory file references are resolved against
    pub uploads_dir: PathBuf,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            cloud_mask_band: "SCL".to_string(),
            default_bands: vec!["B02".to_string(), "B03".to_string(), "B04".to_string()],
            default_cloud_coverage: 20.0,
            item_limit: 400,
            uploads_dir: PathBuf::from("public/uploads"),
        }
    }
}

/// Why a raw request could not be normalized
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("missing required field `{0}`")]
    Missing(&'static str),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl NormalizeError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

type Result<T> = std::result::Result<T, NormalizeError>;

/// Normalize a raw `/start` body
pub fn normalize(raw: &StartRequest, settings: &NormalizeSettings) -> Result<PipelineRequest> {
    let bbox = bounding_box(raw)?;

    let start = raw
        .start_date
        .as_deref()
        .ok_or(NormalizeError::Missing("startDate"))?;
    let end = raw
        .end_date
        .as_deref()
        .ok_or(NormalizeError::Missing("endDate"))?;
    let dates = shift_date_range(start, end)?;

    let bands = match raw.channels.as_deref() {
        Some(channels) if !channels.is_empty() => {
            normalize_bands(channels, &settings.cloud_mask_band)?
        }
        _ => normalize_bands(&settings.default_bands, &settings.cloud_mask_band)?,
    };

    let resolution = parse_resolution(
        raw.resolution
            .as_ref()
            .ok_or(NormalizeError::Missing("resolution"))?,
    )?;

    let cloud_coverage = match number("coverage", raw.coverage.as_ref())? {
        Some(coverage) if (0.0..=100.0).contains(&coverage) => coverage,
        Some(coverage) => {
            return Err(NormalizeError::invalid(
                "coverage",
                format!("{coverage} is outside 0-100"),
            ));
        }
        None => settings.default_cloud_coverage,
    };

    Ok(PipelineRequest {
        bbox,
        dates,
        bands,
        resolution,
        cloud_coverage,
        item_limit: settings.item_limit,
        mode: mode(raw, &settings.uploads_dir)?,
        source: source(raw),
    })
}

/// Ensure the cloud-mask band is present exactly once
///
/// Order of first appearance is kept and duplicates are dropped, so the
/// result is a fixed point of this function.
pub fn normalize_bands(bands: &[String], cloud_mask_band: &str) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(bands.len() + 1);

    for band in bands {
        let band = band.trim();
        if band.is_empty() {
            return Err(NormalizeError::invalid("channels", "empty band identifier"));
        }
        if !normalized.iter().any(|existing| existing == band) {
            normalized.push(band.to_string());
        }
    }

    if !normalized.iter().any(|band| band == cloud_mask_band) {
        normalized.push(cloud_mask_band.to_string());
    }

    Ok(normalized)
}

/// Parse both bounds and shift them one day forward
pub fn shift_date_range(start: &str, end: &str) -> Result<DateRange> {
    let start = parse_date("startDate", start)?;
    let end = parse_date("endDate", end)?;

    if start > end {
        return Err(NormalizeError::invalid(
            "startDate",
            format!("{start} is after {end}"),
        ));
    }

    DateRange::shifted(start, end)
        .ok_or_else(|| NormalizeError::invalid("endDate", "date out of range"))
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(NormalizeError::Missing(field));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
        .map_err(|_| NormalizeError::invalid(field, format!("'{raw}' is not a date")))
}

fn parse_resolution(raw: &Value) -> Result<u32> {
    let invalid = || NormalizeError::invalid("resolution", format!("'{raw}' is not a positive integer"));

    let resolution = match raw {
        Value::Number(n) => match n.as_u64() {
            Some(value) => u32::try_from(value).map_err(|_| invalid())?,
            None => {
                let value = n.as_f64().ok_or_else(invalid)?;
                if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
                    return Err(invalid());
                }
                value as u32
            }
        },
        Value::String(s) => s.trim().parse::<u32>().map_err(|_| invalid())?,
        Value::Null => return Err(NormalizeError::Missing("resolution")),
        _ => return Err(invalid()),
    };

    if resolution == 0 {
        return Err(invalid());
    }
    Ok(resolution)
}

/// Read an optional number that may have been sent as a string
fn number(field: &'static str, raw: Option<&Value>) -> Result<Option<f64>> {
    let value = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match value {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(NormalizeError::invalid(field, "not a number")),
    }
}

fn bounding_box(raw: &StartRequest) -> Result<BoundingBox> {
    let corners = [
        ("topleftlat", &raw.topleftlat, "topleftlng", &raw.topleftlng),
        ("bottomleftlat", &raw.bottomleftlat, "bottomleftlng", &raw.bottomleftlng),
        ("bottomrightlat", &raw.bottomrightlat, "bottomrightlng", &raw.bottomrightlng),
        ("toprightlat", &raw.toprightlat, "toprightlng", &raw.toprightlng),
    ];

    let mut coordinates = Vec::with_capacity(corners.len());
    for (lat_field, lat, lng_field, lng) in corners {
        match (number(lat_field, lat.as_ref())?, number(lng_field, lng.as_ref())?) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(NormalizeError::invalid(lat_field, format!("{lat} is outside ±90")));
                }
                if !(-180.0..=180.0).contains(&lng) {
                    return Err(NormalizeError::invalid(lng_field, format!("{lng} is outside ±180")));
                }
                coordinates.push(Coordinate::new(lat, lng));
            }
            (None, None) => {}
            (Some(_), None) => return Err(NormalizeError::Missing(lng_field)),
            (None, Some(_)) => return Err(NormalizeError::Missing(lat_field)),
        }
    }

    BoundingBox::enclosing(&coordinates).ok_or(NormalizeError::Missing("coordinates"))
}

fn mode(raw: &StartRequest, uploads_dir: &Path) -> Result<Mode> {
    let option = raw.option.as_deref().ok_or(NormalizeError::Missing("option"))?;
    let filename = raw
        .filename
        .as_deref()
        .ok_or(NormalizeError::Missing("filename"))?;
    let file = resolve_upload(filename, uploads_dir)?;

    match option {
        "data" => Ok(Mode::TrainFromData {
            algorithm: algorithm(raw)?,
            training_data: file,
        }),
        "model" => Ok(Mode::UseExistingModel { model: file }),
        other => Err(NormalizeError::invalid(
            "option",
            format!("expected 'data' or 'model', got '{other}'"),
        )),
    }
}

fn algorithm(raw: &StartRequest) -> Result<Algorithm> {
    match raw.algorithm.as_deref() {
        Some("rf") => Ok(Algorithm::RandomForest {
            mtry: number("mtry", raw.mtry.as_ref())?,
        }),
        Some("svmRadial") => Ok(Algorithm::SvmRadial {
            sigma: number("sigma", raw.sigma.as_ref())?,
            cost: number("cost", raw.cost.as_ref())?,
        }),
        Some(other) => Err(NormalizeError::invalid(
            "algorithm",
            format!("unsupported algorithm '{other}'"),
        )),
        None => Err(NormalizeError::Missing("algorithm")),
    }
}

/// Resolve an uploaded file name against the uploads directory
///
/// Only plain relative paths are accepted.
pub fn resolve_upload(filename: &str, uploads_dir: &Path) -> Result<PathBuf> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err(NormalizeError::Missing("filename"));
    }

    let relative = Path::new(filename);
    let plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !plain {
        return Err(NormalizeError::invalid(
            "filename",
            format!("'{filename}' must stay inside the uploads directory"),
        ));
    }

    Ok(uploads_dir.join(relative))
}

/// Demo wins over test when a request claims both
fn source(raw: &StartRequest) -> Source {
    if raw.whereareyoufrom.as_deref() == Some("demo") {
        Source::Demo
    } else if raw.areyouatest.as_ref().is_some_and(truthy) {
        Source::TestFixture
    } else {
        Source::Live
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
