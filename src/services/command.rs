use std::io::ErrorKind;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Runs an external tool to completion, bounded by `limit`.
///
/// A binary that cannot be spawned maps to `ToolUnavailable`; a non-zero
/// exit status maps to `Internal` with the tool's stderr attached. Callers
/// re-wrap the latter as an extraction failure for their file kind.
pub async fn run_tool(mut command: Command, tool: &str, limit: Duration) -> AppResult<Output> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command.spawn().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            AppError::tool_unavailable(tool)
        } else {
            AppError::internal(format!("Failed to execute {}: {}", tool, e))
        }
    })?;

    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(AppError::internal(format!("Failed to wait for {}: {}", tool, e)));
        }
        // The child is dropped with the future and killed.
        Err(_) => return Err(AppError::Timeout),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::internal(format!(
            "{} exited with status {}: {}",
            tool,
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    Ok(output)
}

/// Checks that `binary` can be executed and exits cleanly with `arg`.
pub async fn probe_tool(binary: &str, arg: &str) -> bool {
    let mut command = Command::new(binary);
    command
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match timeout(Duration::from_secs(5), command.status()).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(e)) => {
            debug!("{} is not executable: {}", binary, e);
            false
        }
        Err(_) => false,
    }
}
