//! AOA Engine Client
//!
//! The only way the pipeline talks to the computation engine. A procedure is
//! identified by the script that defines it and the function to call; it
//! takes a JSON parameter bag and answers with an array whose first element
//! is a string status code.
//!
//! Two transports implement [`ProcedureClient`]:
//! - [`CommandProcedureClient`] runs an R interpreter per call
//! - [`HttpProcedureClient`] posts the parameter bag to an engine service
//!
//! [`EngineInvoker`] wraps either one, bounds every call with a deadline and
//! turns every failure into a recorded [`CallReply::TransportFailure`].
//!
//! # Example
//!
//! ```no_run
//! use aoa_core::domain::call::{ParamBag, Procedure};
//! use aoa_engine::{EngineInvoker, HttpProcedureClient};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let client = HttpProcedureClient::new("http://localhost:8000");
//! let invoker = EngineInvoker::new(Arc::new(client), Duration::from_secs(60));
//!
//! let call = invoker
//!     .invoke(&Procedure::new("Check_TrainingData.R", "checkTrainingData"), ParamBag::new())
//!     .await;
//! println!("code: {}", call.status_code("error"));
//! # }
//! ```
//!
//! [`CallReply::TransportFailure`]: aoa_core::domain::call::CallReply::TransportFailure

mod command;
pub mod error;
mod http;
mod invoker;

pub use command::CommandProcedureClient;
pub use error::{EngineError, Result};
pub use http::HttpProcedureClient;
pub use invoker::{EngineInvoker, parse_codes};

use aoa_core::domain::call::{ParamBag, Procedure};
use async_trait::async_trait;
use serde_json::Value;

/// A transport able to run one engine procedure
///
/// Implementations return the raw JSON reply; shape checks happen in the
/// invoker so every transport is judged by the same rules.
#[async_trait]
pub trait ProcedureClient: Send + Sync {
    async fn call(&self, procedure: &Procedure, params: &ParamBag) -> Result<Value>;
}
