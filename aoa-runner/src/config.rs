//! Pipeline configuration
//!
//! Defines every tunable of the pipeline: where files live, how the engine
//! is reached, which procedures each stage calls, and the defaults the
//! request normalizer falls back on.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aoa_core::domain::call::Procedure;
use aoa_core::normalize::NormalizeSettings;
use aoa_engine::{CommandProcedureClient, HttpProcedureClient, ProcedureClient};

/// How the computation engine is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSettings {
    /// Spawn an interpreter per call
    Command {
        program: PathBuf,
        scripts_dir: PathBuf,
    },
    /// Post calls to an engine service
    Http { base_url: String },
}

/// Engine procedure called by each stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureCatalog {
    pub validate_training_data: Procedure,
    pub aoi_imagery: Procedure,
    pub training_imagery: Procedure,
    pub train_model: Procedure,
    pub classify: Procedure,
    /// Not a stage: backs the GeoPackage preview route
    pub convert_geopackage: Procedure,
}

impl Default for ProcedureCatalog {
    fn default() -> Self {
        Self {
            validate_training_data: Procedure::new("Check_TrainingData.R", "checkTrainingData"),
            aoi_imagery: Procedure::new("GetSatelliteImages.R", "generateSatelliteImageFromAOI"),
            training_imagery: Procedure::new(
                "GetSatelliteImages.R",
                "generateSatelliteImageFromTrainingData",
            ),
            train_model: Procedure::new("ML_AOA.R", "training"),
            classify: Procedure::new("ML_AOA.R", "classifyAndAOA"),
            convert_geopackage: Procedure::new(
                "convertGeoPackageToGeoJson.R",
                "convertGeoPackageToGeoJson",
            ),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding uploaded training data and models
    pub uploads_dir: PathBuf,

    /// Parent of the per-run workspaces
    pub work_root: PathBuf,

    /// Shared output directory artifacts are published to
    pub output_dir: PathBuf,

    /// Directory holding the `demo/` and `test/` fixtures
    pub fixtures_dir: PathBuf,

    pub engine: EngineSettings,

    pub procedures: ProcedureCatalog,

    /// Deadline for every single engine call
    pub call_timeout: Duration,

    pub cloud_mask_band: String,
    pub default_bands: Vec<String>,
    pub default_cloud_coverage: f64,

    /// Maximum number of STAC items per acquisition
    pub item_limit: u32,

    /// Keep run workspaces after publishing (for debugging)
    pub keep_workspaces: bool,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(
        uploads_dir: impl Into<PathBuf>,
        work_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        engine: EngineSettings,
    ) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            work_root: work_root.into(),
            output_dir: output_dir.into(),
            fixtures_dir: PathBuf::from("fixtures"),
            engine,
            procedures: ProcedureCatalog::default(),
            call_timeout: Duration::from_secs(1800), // 30 minutes
            cloud_mask_band: "SCL".to_string(),
            default_bands: vec!["B02".to_string(), "B03".to_string(), "B04".to_string()],
            default_cloud_coverage: 20.0,
            item_limit: 400,
            keep_workspaces: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - AOA_UPLOADS_DIR (default: public/uploads)
    /// - AOA_WORK_ROOT (default: work)
    /// - AOA_OUTPUT_DIR (default: output)
    /// - AOA_FIXTURES_DIR (default: fixtures)
    /// - AOA_ENGINE (`command` or `http`, default: command)
    /// - AOA_RSCRIPT (default: Rscript)
    /// - AOA_SCRIPTS_DIR (default: R)
    /// - AOA_ENGINE_URL (required when AOA_ENGINE=http)
    /// - AOA_CALL_TIMEOUT (seconds, default: 1800)
    /// - AOA_CLOUD_COVERAGE (percent, default: 20)
    /// - AOA_ITEM_LIMIT (default: 400)
    /// - AOA_KEEP_WORKSPACES (default: false)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let engine = match std::env::var("AOA_ENGINE").as_deref() {
            Ok("http") => {
                let base_url = std::env::var("AOA_ENGINE_URL").map_err(|_| {
                    anyhow::anyhow!("AOA_ENGINE_URL environment variable not set")
                })?;
                EngineSettings::Http { base_url }
            }
            Ok("command") | Err(_) => EngineSettings::Command {
                program: env_path("AOA_RSCRIPT").unwrap_or_else(|| PathBuf::from("Rscript")),
                scripts_dir: env_path("AOA_SCRIPTS_DIR").unwrap_or_else(|| PathBuf::from("R")),
            },
            Ok(other) => anyhow::bail!("AOA_ENGINE must be 'command' or 'http', got '{}'", other),
        };

        let call_timeout = std::env::var("AOA_CALL_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.call_timeout);

        let default_cloud_coverage = std::env::var("AOA_CLOUD_COVERAGE")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(defaults.default_cloud_coverage);

        let item_limit = std::env::var("AOA_ITEM_LIMIT")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.item_limit);

        let keep_workspaces = std::env::var("AOA_KEEP_WORKSPACES")
            .ok()
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(defaults.keep_workspaces);

        Ok(Self {
            uploads_dir: env_path("AOA_UPLOADS_DIR").unwrap_or(defaults.uploads_dir),
            work_root: env_path("AOA_WORK_ROOT").unwrap_or(defaults.work_root),
            output_dir: env_path("AOA_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            fixtures_dir: env_path("AOA_FIXTURES_DIR").unwrap_or(defaults.fixtures_dir),
            engine,
            call_timeout,
            default_cloud_coverage,
            item_limit,
            keep_workspaces,
            ..defaults
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, path) in [
            ("uploads_dir", &self.uploads_dir),
            ("work_root", &self.work_root),
            ("output_dir", &self.output_dir),
            ("fixtures_dir", &self.fixtures_dir),
        ] {
            if path.as_os_str().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
        }

        match &self.engine {
            EngineSettings::Command { program, .. } if program.as_os_str().is_empty() => {
                anyhow::bail!("engine program cannot be empty");
            }
            EngineSettings::Http { base_url }
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") =>
            {
                anyhow::bail!("engine base_url must start with http:// or https://");
            }
            _ => {}
        }

        if self.call_timeout.is_zero() {
            anyhow::bail!("call_timeout must be greater than 0");
        }

        if self.cloud_mask_band.trim().is_empty() {
            anyhow::bail!("cloud_mask_band cannot be empty");
        }

        if self.default_bands.iter().any(|band| band.trim().is_empty()) {
            anyhow::bail!("default_bands cannot contain empty band identifiers");
        }

        if !(0.0..=100.0).contains(&self.default_cloud_coverage) {
            anyhow::bail!("default_cloud_coverage must be within 0-100");
        }

        if self.item_limit == 0 {
            anyhow::bail!("item_limit must be greater than 0");
        }

        Ok(())
    }

    /// Settings handed to the request normalizer
    pub fn normalize_settings(&self) -> NormalizeSettings {
        NormalizeSettings {
            cloud_mask_band: self.cloud_mask_band.clone(),
            default_bands: self.default_bands.clone(),
            default_cloud_coverage: self.default_cloud_coverage,
            item_limit: self.item_limit,
            uploads_dir: self.uploads_dir.clone(),
        }
    }

    /// Builds the transport selected by `engine`
    pub fn build_client(&self) -> Arc<dyn ProcedureClient> {
        match &self.engine {
            EngineSettings::Command {
                program,
                scripts_dir,
            } => Arc::new(CommandProcedureClient::new(program, scripts_dir)),
            EngineSettings::Http { base_url } => Arc::new(HttpProcedureClient::new(base_url)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            "public/uploads",
            "work",
            "output",
            EngineSettings::Command {
                program: PathBuf::from("Rscript"),
                scripts_dir: PathBuf::from("R"),
            },
        )
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.uploads_dir, PathBuf::from("public/uploads"));
        assert_eq!(config.call_timeout, Duration::from_secs(1800));
        assert_eq!(config.item_limit, 400);
        assert_eq!(config.cloud_mask_band, "SCL");
        assert!(!config.keep_workspaces);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Valid config should pass
        assert!(config.validate().is_ok());

        config.call_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.call_timeout = Duration::from_secs(60);

        config.default_cloud_coverage = 120.0;
        assert!(config.validate().is_err());
        config.default_cloud_coverage = 20.0;

        config.engine = EngineSettings::Http {
            base_url: "not-a-url".to_string(),
        };
        assert!(config.validate().is_err());

        config.engine = EngineSettings::Http {
            base_url: "http://localhost:8000".to_string(),
        };
        assert!(config.validate().is_ok());

        config.work_root = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalize_settings_follow_config() {
        let mut config = Config::default();
        config.item_limit = 50;
        config.default_bands = vec!["B08".to_string()];

        let settings = config.normalize_settings();
        assert_eq!(settings.item_limit, 50);
        assert_eq!(settings.default_bands, vec!["B08".to_string()]);
        assert_eq!(settings.cloud_mask_band, "SCL");
        assert_eq!(settings.uploads_dir, config.uploads_dir);
    }

    #[test]
    fn test_default_procedures() {
        let procedures = ProcedureCatalog::default();
        assert_eq!(
            procedures.validate_training_data.to_string(),
            "Check_TrainingData.R::checkTrainingData"
        );
        assert_eq!(procedures.classify.to_string(), "ML_AOA.R::classifyAndAOA");
        assert_eq!(
            procedures.convert_geopackage.to_string(),
            "convertGeoPackageToGeoJson.R::convertGeoPackageToGeoJson"
        );
    }
}
