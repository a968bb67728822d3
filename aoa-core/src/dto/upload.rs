//! Upload and purge DTOs

use serde::{Deserialize, Serialize};

use crate::domain::outcome::StageOutcome;

/// Answer to an accepted upload, or to a request without a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
}

/// Answer to an upload whose training data did not validate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRejection {
    pub status: String,
    pub message: String,
    pub error: StageOutcome,
}

impl UploadRejection {
    pub fn new(outcome: StageOutcome) -> Self {
        Self {
            status: "error".to_string(),
            message: "Invalid training data".to_string(),
            error: outcome,
        }
    }
}

/// Request to purge the uploads directory, keeping one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteFilesRequest {
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFilesResponse {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_wire_shape() {
        let rejection =
            UploadRejection::new(StageOutcome::error("missing required label column", "1"));
        let json = serde_json::to_value(&rejection).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Invalid training data");
        assert_eq!(json["error"]["status"], "error");
        assert_eq!(json["error"]["code"], "1");
    }

    #[test]
    fn test_delete_request_file_is_optional() {
        let req: DeleteFilesRequest = serde_json::from_str("{}").unwrap();
        assert!(req.file.is_none());
    }
}
