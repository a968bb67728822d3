use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aoa_core::domain::call::{CallReply, ParamBag, Procedure};
use aoa_engine::{
    CommandProcedureClient, EngineError, EngineInvoker, HttpProcedureClient, ProcedureClient,
};
use mockito::Matcher;
use serde_json::{Value, json};
use tempfile::TempDir;

fn params() -> ParamBag {
    let mut params = ParamBag::new();
    params.insert("trainingDataPath".into(), json!("uploads/polygons.gpkg"));
    params.insert("hyperparameter".into(), json!([2, null]));
    params
}

fn training() -> Procedure {
    Procedure::new("ML_AOA.R", "training")
}

/// Write an executable stand-in for the interpreter
fn fake_interpreter(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-rscript");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn test_command_client_feeds_params_on_stdin() {
    let dir = TempDir::new().unwrap();
    let program = fake_interpreter(dir.path(), "echo 'loading packages'\ncat\necho");
    let client = CommandProcedureClient::new(program, dir.path());

    let reply = client.call(&training(), &params()).await.unwrap();
    assert_eq!(reply, Value::Object(params()));
}

#[tokio::test]
async fn test_command_client_reads_last_line() {
    let dir = TempDir::new().unwrap();
    let program = fake_interpreter(dir.path(), "cat > /dev/null\necho 'Loading required package: terra'\necho '[\"0\"]'");
    let client = CommandProcedureClient::new(program, dir.path());

    let invoker = EngineInvoker::new(Arc::new(client), Duration::from_secs(30));
    let call = invoker.invoke(&training(), params()).await;

    assert_eq!(
        call.reply,
        CallReply::Returned {
            codes: vec!["0".to_string()]
        }
    );
}

#[tokio::test]
async fn test_command_client_reports_failed_process() {
    let dir = TempDir::new().unwrap();
    let program = fake_interpreter(dir.path(), "echo 'Error in library(terra)' >&2\nexit 3");
    let client = CommandProcedureClient::new(program, dir.path());

    let err = client.call(&training(), &params()).await.unwrap_err();
    match err {
        EngineError::ProcessFailed { exit_code, stderr } => {
            assert_eq!(exit_code, Some(3));
            assert!(stderr.contains("terra"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_command_client_rejects_non_json_output() {
    let dir = TempDir::new().unwrap();
    let program = fake_interpreter(dir.path(), "echo 'model written'");
    let client = CommandProcedureClient::new(program, dir.path());

    let err = client.call(&training(), &params()).await.unwrap_err();
    assert!(matches!(err, EngineError::ParseError(_)));
}

#[tokio::test]
async fn test_command_client_missing_interpreter() {
    let dir = TempDir::new().unwrap();
    let client = CommandProcedureClient::new(dir.path().join("no-such-rscript"), dir.path());

    let err = client.call(&training(), &params()).await.unwrap_err();
    assert!(matches!(err, EngineError::Spawn(_)));
}

#[tokio::test]
async fn test_command_client_is_killed_on_deadline() {
    let dir = TempDir::new().unwrap();
    let program = fake_interpreter(dir.path(), "sleep 10\necho '[\"0\"]'");
    let client = CommandProcedureClient::new(program, dir.path());

    let invoker = EngineInvoker::new(Arc::new(client), Duration::from_millis(200));
    let call = invoker.invoke(&training(), params()).await;

    assert!(call.is_transport_failure());
    assert_eq!(call.status_code("2"), "2");
}

#[tokio::test]
async fn test_http_client_posts_params() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/procedures/ML_AOA.R/training")
        .match_body(Matcher::Json(Value::Object(params())))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"["0"]"#)
        .create_async()
        .await;

    let client = HttpProcedureClient::new(server.url());
    let reply = client.call(&training(), &params()).await.unwrap();

    assert_eq!(reply, json!(["0"]));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_client_maps_error_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/procedures/ML_AOA.R/training")
        .with_status(500)
        .with_body("R session crashed")
        .create_async()
        .await;

    let client = HttpProcedureClient::new(server.url());
    let err = client.call(&training(), &params()).await.unwrap_err();

    match err {
        EngineError::ApiError { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "R session crashed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_http_malformed_reply_is_transport_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/procedures/ML_AOA.R/training")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code": "0"}"#)
        .create_async()
        .await;

    let client = HttpProcedureClient::new(server.url());
    let invoker = EngineInvoker::new(Arc::new(client), Duration::from_secs(5));
    let call = invoker.invoke(&training(), params()).await;

    assert!(call.is_transport_failure());
    assert!(call.failure_reason().unwrap().contains("Malformed"));
}
