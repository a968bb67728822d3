//! Interpreter transport

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;

use aoa_core::domain::call::{ParamBag, Procedure};
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::ProcedureClient;
use crate::error::{EngineError, Result};

/// Runs each procedure in a fresh R interpreter
///
/// The interpreter sources `<scripts_dir>/<script>`, reads the parameter bag
/// as JSON from stdin, calls the function with it and prints the JSON result.
/// The last non-empty stdout line is taken as the reply, so scripts may log
/// to stdout freely before that.
#[derive(Debug, Clone)]
pub struct CommandProcedureClient {
    program: PathBuf,
    scripts_dir: PathBuf,
}

impl CommandProcedureClient {
    /// Create a client running `program` (usually `Rscript`)
    pub fn new(program: impl Into<PathBuf>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            scripts_dir: scripts_dir.into(),
        }
    }

    /// Build the `-e` expression for a procedure
    fn expression(&self, procedure: &Procedure) -> Result<String> {
        if !is_plain_file_name(&procedure.script) {
            return Err(EngineError::InvalidProcedure(format!(
                "script '{}' is not a plain file name",
                procedure.script
            )));
        }
        if !is_r_identifier(&procedure.function) {
            return Err(EngineError::InvalidProcedure(format!(
                "function '{}' is not a valid identifier",
                procedure.function
            )));
        }

        let script = self.scripts_dir.join(&procedure.script);
        Ok(format!(
            "args <- jsonlite::fromJSON(file(\"stdin\")); \
             source(\"{}\"); \
             result <- do.call({}, args); \
             cat(jsonlite::toJSON(result), \"\\n\")",
            escape_r_string(&script.to_string_lossy()),
            procedure.function
        ))
    }
}

#[async_trait]
impl ProcedureClient for CommandProcedureClient {
    async fn call(&self, procedure: &Procedure, params: &ParamBag) -> Result<Value> {
        let expression = self.expression(procedure)?;
        let input = serde_json::to_vec(params)
            .map_err(|e| EngineError::ParseError(format!("Failed to encode parameters: {}", e)))?;

        debug!(%procedure, program = %self.program.display(), "Spawning engine process");

        let mut child = Command::new(&self.program)
            .arg("--vanilla")
            .arg("-e")
            .arg(&expression)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A process that exits without reading its input is judged by its output
            match stdin.write_all(&input).await {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(EngineError::ProcessFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let reply = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .ok_or_else(|| EngineError::ParseError("engine printed nothing".to_string()))?;

        serde_json::from_str(reply)
            .map_err(|e| EngineError::ParseError(format!("'{}': {}", reply, e)))
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

fn is_r_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '.' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        }
        _ => false,
    }
}

fn escape_r_string(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procedure() -> Procedure {
        Procedure::new("ML_AOA.R", "classifyAndAOA")
    }

    #[test]
    fn test_expression_sources_script() {
        let client = CommandProcedureClient::new("Rscript", "/opt/engine/R");
        let expression = client.expression(&procedure()).unwrap();

        assert!(expression.contains("source(\"/opt/engine/R/ML_AOA.R\")"));
        assert!(expression.contains("do.call(classifyAndAOA, args)"));
        assert!(!expression.contains('\n'));
    }

    #[test]
    fn test_expression_escapes_quotes() {
        let client = CommandProcedureClient::new("Rscript", "/tmp/we\"ird");
        let expression = client.expression(&procedure()).unwrap();
        assert!(expression.contains("/tmp/we\\\"ird/ML_AOA.R"));
    }

    #[test]
    fn test_rejects_unsafe_procedures() {
        let client = CommandProcedureClient::new("Rscript", "R");

        let err = client
            .expression(&Procedure::new("../ML_AOA.R", "training"))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidProcedure(_)));

        let err = client
            .expression(&Procedure::new("ML_AOA.R", "training); system('rm')"))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidProcedure(_)));
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_r_identifier("generateSatelliteImageFromAOI"));
        assert!(is_r_identifier("check_training.data"));
        assert!(!is_r_identifier("1training"));
        assert!(!is_r_identifier(""));
    }
}
