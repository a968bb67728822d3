//! Stage outcome types

use serde::{Deserialize, Serialize};

/// Result of one pipeline stage
///
/// Produced once per stage, in stage order, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Ok {
        summary: String,
    },
    Error {
        message: String,
        /// Raw code returned by the engine, or the stage's canonical
        /// unexpected code when the call never produced one
        code: String,
    },
    NotExecuted {
        reason: String,
    },
}

impl StageOutcome {
    pub fn ok(summary: impl Into<String>) -> Self {
        Self::Ok {
            summary: summary.into(),
        }
    }

    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn not_executed(reason: impl Into<String>) -> Self {
        Self::NotExecuted {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn is_not_executed(&self) -> bool {
        matches!(self, Self::NotExecuted { .. })
    }

    /// Error code, if this outcome is an error
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Error { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Human-readable text carried by any variant
    pub fn message(&self) -> &str {
        match self {
            Self::Ok { summary } => summary,
            Self::Error { message, .. } => message,
            Self::NotExecuted { reason } => reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_wire_shape() {
        let outcome = StageOutcome::error("no matching items", "1");
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "status": "error",
                "message": "no matching items",
                "code": "1"
            })
        );

        let skipped = serde_json::to_value(StageOutcome::not_executed("upstream failure")).unwrap();
        assert_eq!(skipped["status"], "not_executed");
        assert_eq!(skipped["reason"], "upstream failure");
    }

    #[test]
    fn test_outcome_predicates() {
        let ok = StageOutcome::ok("imagery created");
        assert!(ok.is_ok());
        assert!(!ok.is_error());
        assert_eq!(ok.code(), None);
        assert_eq!(ok.message(), "imagery created");

        let err = StageOutcome::error("unexpected failure", "2");
        assert!(err.is_error());
        assert_eq!(err.code(), Some("2"));

        assert!(StageOutcome::not_executed("skipped").is_not_executed());
    }
}
