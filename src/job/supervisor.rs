//! Process supervisor
//!
//! Runs one planned command on the tokio runtime and reports exactly one
//! [`CompletionEvent`] once the process has exited and both output pipes are
//! drained. stdout and stderr are interleaved line by line in arrival order.
//!
//! Captured bytes are decoded to text here, once. Invalid UTF-8 sequences
//! become U+FFFD; everything downstream (classification, search, copy-output)
//! works on that decoded text, and the round trip through the classifier is
//! exact with respect to it.

use super::planner::ToolCommand;
use super::JobId;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The process ran. `code` is `None` when it was killed by a signal.
    Exited { code: Option<i32>, output: String },
    /// The process never started.
    LaunchFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub job_id: JobId,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

/// Run `command` to completion.
///
/// The child is killed if this future is dropped (runtime shutdown).
pub async fn run(job_id: JobId, command: ToolCommand) -> CompletionEvent {
    let started = Instant::now();
    let outcome = execute(job_id, &command).await;
    CompletionEvent {
        job_id,
        outcome,
        elapsed: started.elapsed(),
    }
}

async fn execute(job_id: JobId, command: &ToolCommand) -> Outcome {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(&command.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &command.env {
        cmd.env(key, value);
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(job = %job_id, program = %command.program.display(), error = %e, "spawn failed");
            return Outcome::LaunchFailed {
                message: launch_message(&command.program, &e),
            };
        }
    };
    info!(job = %job_id, pid = ?child.id(), "tool started");

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.kill().await;
        return Outcome::LaunchFailed {
            message: "Failed to capture tool output".to_string(),
        };
    };

    let output = match drain_interleaved(stdout, stderr).await {
        Ok(bytes) => decode_output(job_id, bytes),
        Err(e) => {
            warn!(job = %job_id, error = %e, "reading tool output failed");
            String::new()
        }
    };

    let code = match child.wait().await {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(job = %job_id, error = %e, "waiting for tool failed");
            None
        }
    };
    debug!(job = %job_id, ?code, bytes = output.len(), "tool exited");

    Outcome::Exited { code, output }
}

fn decode_output(job_id: JobId, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!(
                job = %job_id,
                valid_up_to = e.utf8_error().valid_up_to(),
                "tool output is not UTF-8, replacing invalid bytes"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Read both streams until EOF, appending whole lines to one buffer in the
/// order they arrive.
async fn drain_interleaved<O, E>(stdout: O, stderr: E) -> io::Result<Vec<u8>>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out = BufReader::new(stdout);
    let mut err = BufReader::new(stderr);
    let mut out_line = Vec::new();
    let mut err_line = Vec::new();
    let mut out_open = true;
    let mut err_open = true;
    let mut combined = Vec::new();

    // `read_until` keeps partial reads in its buffer when the other branch
    // wins, so a line is only moved once it is complete (or at EOF).
    while out_open || err_open {
        tokio::select! {
            read = out.read_until(b'\n', &mut out_line), if out_open => {
                if read? == 0 {
                    out_open = false;
                }
                combined.append(&mut out_line);
            }
            read = err.read_until(b'\n', &mut err_line), if err_open => {
                if read? == 0 {
                    err_open = false;
                }
                combined.append(&mut err_line);
            }
        }
    }
    Ok(combined)
}

fn launch_message(program: &Path, error: &io::Error) -> String {
    match error.kind() {
        io::ErrorKind::NotFound => format!("{} was not found on PATH", program.display()),
        io::ErrorKind::PermissionDenied => format!("{} is not executable", program.display()),
        _ => format!("Failed to start {}: {}", program.display(), error),
    }
}
