//! Deadline-bounded, failure-capturing call wrapper

use std::sync::Arc;
use std::time::{Duration, Instant};

use aoa_core::domain::call::{CallReply, ExternalCall, ParamBag, Procedure};
use serde_json::Value;
use tracing::{debug, warn};

use crate::ProcedureClient;
use crate::error::{EngineError, Result};

/// Runs procedures through a [`ProcedureClient`] and records every call
///
/// `invoke` never fails: spawn errors, non-zero exits, HTTP errors,
/// malformed replies and missed deadlines all end up as
/// `CallReply::TransportFailure`. There are no retries.
#[derive(Clone)]
pub struct EngineInvoker {
    client: Arc<dyn ProcedureClient>,
    deadline: Duration,
}

impl EngineInvoker {
    pub fn new(client: Arc<dyn ProcedureClient>, deadline: Duration) -> Self {
        Self { client, deadline }
    }

    pub async fn invoke(&self, procedure: &Procedure, params: ParamBag) -> ExternalCall {
        let started = Instant::now();
        let result = self.fetch(procedure, &params).await;

        let reply = match result.and_then(parse_codes) {
            Ok(codes) => {
                debug!(%procedure, ?codes, "Engine procedure returned");
                CallReply::Returned { codes }
            }
            Err(e) => {
                if matches!(e, EngineError::MalformedResponse(_)) {
                    warn!(%procedure, error = %e, "Malformed engine reply");
                }
                CallReply::TransportFailure {
                    reason: e.to_string(),
                }
            }
        };

        ExternalCall {
            procedure: procedure.clone(),
            params,
            reply,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Raw reply of one call, bounded by the deadline
    ///
    /// For procedures that answer with data rather than a code array.
    pub async fn fetch(&self, procedure: &Procedure, params: &ParamBag) -> Result<Value> {
        debug!(%procedure, "Invoking engine procedure");

        let result = match tokio::time::timeout(self.deadline, self.client.call(procedure, params)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::TimedOut(self.deadline)),
        };

        if let Err(e) = &result {
            warn!(%procedure, error = %e, "Engine call failed");
        }
        result
    }
}

impl std::fmt::Debug for EngineInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineInvoker")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Extract the code array from a raw engine reply
///
/// The reply must be a non-empty array whose first element is a string.
/// Later elements are kept for diagnostics, stringified if needed.
pub fn parse_codes(reply: Value) -> Result<Vec<String>> {
    let items = match reply {
        Value::Array(items) => items,
        other => {
            return Err(EngineError::MalformedResponse(format!(
                "expected an array, got {}",
                other
            )));
        }
    };

    match items.first() {
        Some(Value::String(_)) => {}
        Some(other) => {
            return Err(EngineError::MalformedResponse(format!(
                "first element {} is not a string code",
                other
            )));
        }
        None => {
            return Err(EngineError::MalformedResponse(
                "empty result array".to_string(),
            ));
        }
    }

    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedClient(fn() -> Result<Value>);

    #[async_trait]
    impl ProcedureClient for FixedClient {
        async fn call(&self, _procedure: &Procedure, _params: &ParamBag) -> Result<Value> {
            (self.0)()
        }
    }

    struct SlowClient;

    #[async_trait]
    impl ProcedureClient for SlowClient {
        async fn call(&self, _procedure: &Procedure, _params: &ParamBag) -> Result<Value> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(json!(["0"]))
        }
    }

    fn invoker(client: impl ProcedureClient + 'static) -> EngineInvoker {
        EngineInvoker::new(Arc::new(client), Duration::from_millis(100))
    }

    fn procedure() -> Procedure {
        Procedure::new("GetSatelliteImages.R", "generateSatelliteImageFromAOI")
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(parse_codes(json!(["0"])).unwrap(), vec!["0"]);
        assert_eq!(
            parse_codes(json!(["1", 42, null])).unwrap(),
            vec!["1", "42", "null"]
        );
    }

    #[test]
    fn test_parse_codes_rejects_malformed_replies() {
        for reply in [json!({"code": "0"}), json!([]), json!([0]), json!("0"), json!(null)] {
            let err = parse_codes(reply).unwrap_err();
            assert!(matches!(err, EngineError::MalformedResponse(_)));
        }
    }

    #[tokio::test]
    async fn test_invoke_records_returned_codes() {
        let mut params = ParamBag::new();
        params.insert("resolution".into(), json!(20));

        let call = invoker(FixedClient(|| Ok(json!(["3"]))))
            .invoke(&procedure(), params.clone())
            .await;

        assert_eq!(call.procedure, procedure());
        assert_eq!(call.params, params);
        assert_eq!(
            call.reply,
            CallReply::Returned {
                codes: vec!["3".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn test_invoke_captures_client_errors() {
        let call = invoker(FixedClient(|| Err(EngineError::api_error(500, "boom"))))
            .invoke(&procedure(), ParamBag::new())
            .await;

        assert!(call.is_transport_failure());
        assert!(call.failure_reason().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_invoke_treats_malformed_reply_as_transport_failure() {
        let call = invoker(FixedClient(|| Ok(json!({"status": "ok"}))))
            .invoke(&procedure(), ParamBag::new())
            .await;

        assert!(call.is_transport_failure());
        assert_eq!(call.status_code("2"), "2");
    }

    #[tokio::test]
    async fn test_fetch_returns_raw_reply() {
        let reply = invoker(FixedClient(|| Ok(json!({"type": "FeatureCollection"}))))
            .fetch(&procedure(), &ParamBag::new())
            .await
            .unwrap();
        assert_eq!(reply["type"], "FeatureCollection");

        let err = invoker(SlowClient)
            .fetch(&procedure(), &ParamBag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TimedOut(_)));
    }

    #[tokio::test]
    async fn test_invoke_enforces_deadline() {
        let call = invoker(SlowClient).invoke(&procedure(), ParamBag::new()).await;

        assert!(call.is_transport_failure());
        assert!(call.failure_reason().unwrap().contains("timed out"));
        assert!(call.elapsed_ms < 5_000);
    }
}
