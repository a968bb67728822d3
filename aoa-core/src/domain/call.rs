//! External procedure call records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter bag handed to an engine procedure
pub type ParamBag = serde_json::Map<String, serde_json::Value>;

/// Identity of an engine procedure: the script defining it and the function to call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Procedure {
    pub script: String,
    pub function: String,
}

impl Procedure {
    pub fn new(script: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            function: function.into(),
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.script, self.function)
    }
}

/// What came back from one engine call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallReply {
    /// The engine answered with a well-formed code array
    Returned { codes: Vec<String> },
    /// The engine could not be reached, crashed, timed out or answered garbage
    TransportFailure { reason: String },
}

/// One invocation of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalCall {
    pub procedure: Procedure,
    pub params: ParamBag,
    pub reply: CallReply,
    pub elapsed_ms: u64,
}

impl ExternalCall {
    /// Status code of the call
    ///
    /// On transport failure the caller's canonical `unexpected` code stands
    /// in, so each stage keeps its own code table.
    pub fn status_code<'a>(&'a self, unexpected: &'a str) -> &'a str {
        match &self.reply {
            CallReply::Returned { codes } => codes.first().map(String::as_str).unwrap_or(unexpected),
            CallReply::TransportFailure { .. } => unexpected,
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(self.reply, CallReply::TransportFailure { .. })
    }

    /// Transport failure reason, if any
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.reply {
            CallReply::TransportFailure { reason } => Some(reason),
            CallReply::Returned { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(reply: CallReply) -> ExternalCall {
        ExternalCall {
            procedure: Procedure::new("ML_AOA.R", "training"),
            params: ParamBag::new(),
            reply,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_procedure_display() {
        let procedure = Procedure::new("GetSatelliteImages.R", "generateSatelliteImageFromAOI");
        assert_eq!(
            procedure.to_string(),
            "GetSatelliteImages.R::generateSatelliteImageFromAOI"
        );
    }

    #[test]
    fn test_status_code_uses_first_element() {
        let returned = call(CallReply::Returned {
            codes: vec!["3".into(), "extra".into()],
        });
        assert_eq!(returned.status_code("2"), "3");
        assert!(!returned.is_transport_failure());
    }

    #[test]
    fn test_transport_failure_maps_to_unexpected_code() {
        let failed = call(CallReply::TransportFailure {
            reason: "process exited with status 1".into(),
        });
        assert_eq!(failed.status_code("2"), "2");
        assert_eq!(failed.status_code("error"), "error");
        assert_eq!(failed.failure_reason(), Some("process exited with status 1"));
    }
}
