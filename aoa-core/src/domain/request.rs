//! Pipeline request domain types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned bounding box of the area of interest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Smallest box enclosing every given corner
    ///
    /// Returns `None` when no corner is given.
    pub fn enclosing(corners: &[Coordinate]) -> Option<Self> {
        let (first, rest) = corners.split_first()?;
        let seed = Self {
            min_lng: first.lng,
            min_lat: first.lat,
            max_lng: first.lng,
            max_lat: first.lat,
        };

        Some(rest.iter().fold(seed, |bbox, corner| Self {
            min_lng: bbox.min_lng.min(corner.lng),
            min_lat: bbox.min_lat.min(corner.lat),
            max_lng: bbox.max_lng.max(corner.lng),
            max_lat: bbox.max_lat.max(corner.lat),
        }))
    }

    pub fn bottom_left(&self) -> Coordinate {
        Coordinate::new(self.min_lat, self.min_lng)
    }

    pub fn top_right(&self) -> Coordinate {
        Coordinate::new(self.max_lat, self.max_lng)
    }
}

/// Date window handed to the engine
///
/// Both bounds are already shifted one day forward to compensate for the
/// engine's date convention, see [`DateRange::shifted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds the engine-facing range from the dates the user picked
    ///
    /// The one-day shift is fixed and not configurable. Returns `None` only
    /// when a bound is the last representable date.
    pub fn shifted(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        Some(Self {
            start: start.succ_opt()?,
            end: end.succ_opt()?,
        })
    }

    /// The range as `YYYY-MM-DD/YYYY-MM-DD`
    pub fn to_range_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Model training algorithm and its hyperparameters
///
/// Unset hyperparameters are sent as `null` so the engine falls back to its
/// own tuning defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id")]
pub enum Algorithm {
    #[serde(rename = "rf")]
    RandomForest { mtry: Option<f64> },
    #[serde(rename = "svmRadial")]
    SvmRadial {
        sigma: Option<f64>,
        cost: Option<f64>,
    },
}

impl Algorithm {
    /// Identifier understood by the engine
    pub fn id(&self) -> &'static str {
        match self {
            Algorithm::RandomForest { .. } => "rf",
            Algorithm::SvmRadial { .. } => "svmRadial",
        }
    }

    /// Hyperparameters in the positional order the engine expects
    pub fn hyperparameters(&self) -> Vec<Option<f64>> {
        match self {
            Algorithm::RandomForest { mtry } => vec![*mtry],
            Algorithm::SvmRadial { sigma, cost } => vec![*sigma, *cost],
        }
    }
}

/// How the model used for classification comes to exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mode {
    /// Train a fresh model from uploaded training polygons
    TrainFromData {
        algorithm: Algorithm,
        training_data: PathBuf,
    },
    /// Classify with a model the user uploaded
    UseExistingModel { model: PathBuf },
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::TrainFromData { .. } => ModeKind::TrainFromData,
            Mode::UseExistingModel { .. } => ModeKind::UseExistingModel,
        }
    }

    /// Path of the uploaded training data, if this mode needs any
    pub fn training_data(&self) -> Option<&Path> {
        match self {
            Mode::TrainFromData { training_data, .. } => Some(training_data),
            Mode::UseExistingModel { .. } => None,
        }
    }
}

/// Data-free discriminant of [`Mode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    TrainFromData,
    UseExistingModel,
}

/// Where the run's inputs come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Imagery is fetched for the user's request
    Live,
    /// Bundled imagery and model are staged, acquisition is bypassed
    Demo,
    /// Test model and training data are staged into uploads, then a live run follows
    TestFixture,
}

impl Source {
    /// Whether imagery is acquired from the engine for this source
    pub fn acquires_imagery(self) -> bool {
        !matches!(self, Source::Demo)
    }
}

/// Canonical, validated pipeline request
///
/// Built once per incoming operation by the normalizer and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub bbox: BoundingBox,
    pub dates: DateRange,
    /// Ordered band identifiers, always containing the cloud-mask band once
    pub bands: Vec<String>,
    /// Meters per pixel
    pub resolution: u32,
    /// Maximum cloud coverage in percent (0-100)
    pub cloud_coverage: f64,
    /// Maximum number of STAC items the engine may consider
    pub item_limit: u32,
    pub mode: Mode,
    pub source: Source,
}
