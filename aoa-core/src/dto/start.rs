//! `/start` request and response DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::outcome::StageOutcome;
use crate::domain::request::ModeKind;
use crate::domain::result::{OverallStatus, PipelineResult};

/// Raw pipeline trigger as sent by the browser client
///
/// Numbers may arrive as JSON numbers or as strings, so they are kept as
/// `Value` until the normalizer has looked at them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whereareyoufrom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub areyouatest: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topleftlat: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topleftlng: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottomleftlat: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottomleftlng: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottomrightlat: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottomrightlng: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toprightlat: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toprightlng: Option<Value>,

    /// `"data"` to train a model, `"model"` to use an uploaded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(
        default,
        rename = "startDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<String>,
    #[serde(default, rename = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Uploaded training data or model, relative to the uploads directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtry: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Value>,
}

/// Imagery acquisition group of the response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StacSection {
    pub aoi: StageOutcome,
    #[serde(rename = "trainingData")]
    pub training_data: StageOutcome,
    pub status: OverallStatus,
}

/// Model and classification group of the response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AoaSection {
    pub training: StageOutcome,
    #[serde(rename = "classifyAndAOA")]
    pub classify_and_aoa: StageOutcome,
    pub status: OverallStatus,
}

/// Response body of `/start`, whatever the status code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    #[serde(rename = "runId")]
    pub run_id: Uuid,
    pub stac: StacSection,
    pub aoa: AoaSection,
    /// Present only for runs that train from uploaded data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<StageOutcome>,
    pub status: OverallStatus,
}

impl From<&PipelineResult> for StartResponse {
    fn from(result: &PipelineResult) -> Self {
        let outcomes = &result.outcomes;
        let validation = match result.mode {
            ModeKind::TrainFromData => Some(outcomes.validation.clone()),
            ModeKind::UseExistingModel => None,
        };

        Self {
            run_id: result.run_id,
            stac: StacSection {
                aoi: outcomes.aoi_imagery.clone(),
                training_data: outcomes.training_imagery.clone(),
                status: result.stac_status(),
            },
            aoa: AoaSection {
                training: outcomes.model.clone(),
                classify_and_aoa: outcomes.classification.clone(),
                status: result.aoa_status(),
            },
            validation,
            status: result.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::Source;
    use crate::domain::result::{StageOutcomes, aggregate};
    use serde_json::json;

    #[test]
    fn test_start_request_accepts_loose_types() {
        let raw = json!({
            "whereareyoufrom": "live",
            "topleftlat": "51.97",
            "topleftlng": 7.60,
            "option": "data",
            "algorithm": "rf",
            "startDate": "2019-01-01",
            "endDate": "2019-01-02",
            "filename": "polygons.gpkg",
            "resolution": "20",
            "channels": ["B02", "B03"],
            "coverage": 30,
            "mtry": "2"
        });

        let req: StartRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(req.start_date.as_deref(), Some("2019-01-01"));
        assert_eq!(req.topleftlat, Some(json!("51.97")));
        assert_eq!(req.resolution, Some(json!("20")));
        assert!(req.bottomleftlat.is_none());
        assert!(req.areyouatest.is_none());
    }

    #[test]
    fn test_start_response_shape() {
        let outcomes = StageOutcomes {
            validation: StageOutcome::not_executed("no training data"),
            aoi_imagery: StageOutcome::ok("imagery created"),
            training_imagery: StageOutcome::not_executed("no training data"),
            model: StageOutcome::not_executed("bypassed"),
            classification: StageOutcome::ok("prediction and AOA computed"),
        };
        let result = aggregate(
            Uuid::nil(),
            ModeKind::UseExistingModel,
            Source::Live,
            outcomes,
        );

        let json = serde_json::to_value(StartResponse::from(&result)).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["stac"]["status"], "ok");
        assert_eq!(json["stac"]["aoi"]["status"], "ok");
        assert_eq!(json["stac"]["trainingData"]["status"], "not_executed");
        assert_eq!(json["aoa"]["training"]["status"], "not_executed");
        assert_eq!(json["aoa"]["classifyAndAOA"]["status"], "ok");
        assert!(json.get("validation").is_none());
    }
}
