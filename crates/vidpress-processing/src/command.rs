//! Child-process invocation for the external media tools.
//!
//! `run_tool` spawns the tool with both output pipes captured and waits for it under a
//! deadline. `wait_with_output` drains stdout and stderr concurrently with waiting for exit,
//! so a chatty tool can never block on a full pipe. If the deadline passes, the wait future
//! is dropped and `kill_on_drop` terminates the child.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::process::Command;
use vidpress_core::IngestError;

const DANGEROUS_CHARS: [char; 11] = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];

/// Errors from launching or waiting on a tool
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed waiting on {tool}: {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} did not finish within {timeout:?}")]
    Timeout { tool: String, timeout: Duration },
}

impl From<ToolError> for IngestError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Timeout { tool, timeout } => IngestError::ToolTimeout {
                tool,
                timeout_secs: timeout.as_secs(),
            },
            ToolError::Spawn { tool, source } | ToolError::Wait { tool, source } => {
                IngestError::ToolLaunch {
                    tool,
                    message: source.to_string(),
                }
            }
        }
    }
}

/// Captured result of a finished tool
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Run `program` with `args` and wait for it to exit, failing after `timeout`.
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Duration) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = tool_name(program);
    let start = Instant::now();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            tool: tool.clone(),
            source,
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => return Err(ToolError::Wait { tool, source }),
        Err(_) => {
            tracing::warn!(
                tool = %tool,
                timeout_secs = timeout.as_secs_f64(),
                "Tool exceeded its deadline and was killed"
            );
            return Err(ToolError::Timeout { tool, timeout });
        }
    };

    tracing::debug!(
        tool = %tool,
        exit_code = ?output.status.code(),
        stdout_bytes = output.stdout.len(),
        stderr_bytes = output.stderr.len(),
        duration_ms = start.elapsed().as_millis(),
        "Tool exited"
    );

    Ok(ToolOutput {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

fn tool_name(program: &str) -> String {
    Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program)
        .to_string()
}

/// Validate that a path doesn't contain shell metacharacters or dangerous sequences
pub fn validate_path(path: &str) -> Result<(), IngestError> {
    if path.chars().any(|c| DANGEROUS_CHARS.contains(&c)) {
        return Err(IngestError::Internal(format!(
            "Path contains dangerous characters: {}",
            path
        )));
    }

    if path.contains("..") {
        return Err(IngestError::Internal(format!(
            "Path contains directory traversal: {}",
            path
        )));
    }

    Ok(())
}

/// Validate a configured tool executable path
pub fn validate_tool_path(path: &str) -> Result<(), IngestError> {
    if path.trim().is_empty() {
        return Err(IngestError::Internal("Tool path is empty".to_string()));
    }

    validate_path(path)?;

    if !path
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '/' | '-' | '_' | '.' | '\\'))
    {
        return Err(IngestError::Internal(format!(
            "Tool path contains unsafe characters: {}",
            path
        )));
    }

    Ok(())
}

/// Validate an artifact path before handing it to a tool
pub fn validate_artifact_path(path: &Path) -> Result<PathBuf, IngestError> {
    validate_path(&path.to_string_lossy())?;
    Ok(path.to_path_buf())
}
