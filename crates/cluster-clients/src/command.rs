//! External command execution
//!
//! Shared runner for the CLI-backed bindings (kind, helm, docker).

use crate::error::ClientError;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Run a command to completion and return its stdout
///
/// The child is killed if the returned future is dropped, so cancelling the
/// caller also stops the external process.
pub async fn run(command: Command) -> Result<String, ClientError> {
    let (program, output) = output(command).await?;
    if !output.status.success() {
        return Err(ClientError::command(program, failure_message(&output)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a command to completion and return its raw output, whatever the exit status
pub async fn output(mut command: Command) -> Result<(String, Output), ClientError> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();
    let args: Vec<String> = command
        .as_std()
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    debug!("Running {} {}", program, args.join(" "));

    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ClientError::Spawn {
            program: program.clone(),
            source: e,
        })?;

    Ok((program, output))
}

/// Best human-readable reason for a failed command
pub fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}
