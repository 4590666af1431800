// leettools-mcp-core/src/runner.rs

//! Runs the `leet` executable once and captures everything it prints.
//!
//! stdout and stderr are drained concurrently on the calling task. Every line goes to
//! the per-call log file (flushed immediately, so a crash leaves a usable partial log)
//! and into an in-memory buffer returned in the [`ProcessOutcome`].
//!
//! The runner never returns an error. Anything that goes wrong is reported as a
//! failed outcome carrying an [`ErrorCode`].

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::errors::{ErrorCode, ErrorEnvelope, LeetError};
use crate::locator::DEFAULT_EXECUTABLE;
use crate::models::ProcessOutcome;

struct Captured {
    stdout: String,
    stderr: String,
    status: ExitStatus,
}

/// Runs `executable` with `args`, logging to `log_path`.
pub async fn run_process(executable: &Path, args: &[String], log_path: &Path) -> ProcessOutcome {
    if is_missing(executable) {
        warn!(executable = %executable.display(), "LeetTools executable not found");
        return executable_not_found();
    }

    match run_and_capture(executable, args, log_path).await {
        Ok(captured) => {
            let log_path = Some(log_path.display().to_string());
            let exit_code = captured.status.code();
            debug!(
                "Command exit status: {:?}\nStdout preview (first 3 lines):\n{}\nStderr preview (first 3 lines):\n{}",
                exit_code,
                captured.stdout.lines().take(3).collect::<Vec<_>>().join("\n"),
                captured.stderr.lines().take(3).collect::<Vec<_>>().join("\n")
            );
            if !captured.status.success() {
                error!(exit_code = ?exit_code, stderr = %captured.stderr, "Command failed");
            }
            ProcessOutcome {
                success: captured.status.success(),
                log_path,
                stdout: Some(captured.stdout),
                stderr: Some(captured.stderr),
                exit_code,
                ..Default::default()
            }
        }
        Err(e) => {
            error!(error = %e, "Error running LeetTools command");
            let details = e.to_string();
            let envelope = ErrorEnvelope::with_code(
                "Error running LeetTools command",
                details.clone(),
                ErrorCode::CommandExecutionError,
            );
            ProcessOutcome {
                success: false,
                content: Some(envelope.to_json()),
                error: Some(details),
                code: Some(ErrorCode::CommandExecutionError.to_string()),
                ..Default::default()
            }
        }
    }
}

/// An empty path, or anything other than the bare fallback name that is not on disk.
fn is_missing(executable: &Path) -> bool {
    executable.as_os_str().is_empty()
        || (executable != Path::new(DEFAULT_EXECUTABLE) && !executable.exists())
}

fn executable_not_found() -> ProcessOutcome {
    let envelope = ErrorEnvelope::with_code(
        "LeetTools executable not found",
        "Please install LeetTools and make sure it's in your PATH.",
        ErrorCode::ExecutableNotFound,
    );
    ProcessOutcome {
        success: false,
        content: Some(envelope.to_json()),
        stdout: Some(String::new()),
        stderr: Some("LeetTools executable not found.".to_string()),
        code: Some(ErrorCode::ExecutableNotFound.to_string()),
        ..Default::default()
    }
}

/// Command line as written to the log, with the `-q` value quoted.
pub fn display_command(executable: &Path, args: &[String]) -> String {
    let mut parts = vec![executable.display().to_string()];
    let mut quote_next = false;
    for arg in args {
        if quote_next {
            parts.push(format!("\"{}\"", arg));
            quote_next = false;
        } else {
            quote_next = arg == "-q";
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

async fn run_and_capture(executable: &Path, args: &[String], log_path: &Path) -> Result<Captured, LeetError> {
    let command_line = display_command(executable, args);
    info!(command = %command_line, "Running command");

    let mut log_file = File::create(log_path).await?;
    let header = format!(
        "Command: {}\nTimestamp: {}\n\n=== STDOUT & STDERR ===\n\n",
        command_line,
        chrono::Local::now().to_rfc3339()
    );
    log_file.write_all(header.as_bytes()).await?;
    log_file.flush().await?;

    let mut child = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| LeetError::Spawn {
            executable: executable.to_path_buf(),
            source,
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| LeetError::Io(std::io::Error::other("child stdout was not captured")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| LeetError::Io(std::io::Error::other("child stderr was not captured")))?;

    let log = Mutex::new(log_file);
    let (stdout_result, stderr_result) = tokio::join!(
        drain_stream(stdout, "STDOUT", &log),
        drain_stream(stderr, "STDERR", &log),
    );
    // Readers are dropped by now, so a child still writing gets EPIPE instead of blocking forever.
    let status = child.wait().await?;
    let stdout = stdout_result?;
    let stderr = stderr_result?;

    let mut log_file = log.into_inner();
    let exit_text = status
        .code()
        .map(|code| code.to_string())
        .unwrap_or_else(|| status.to_string());
    log_file
        .write_all(format!("\nProcess exited with code: {}\n", exit_text).as_bytes())
        .await?;
    log_file.flush().await?;

    Ok(Captured { stdout, stderr, status })
}

/// Reads `reader` to EOF line by line, mirroring each line into the shared log.
async fn drain_stream<R>(reader: R, prefix: &str, log: &Mutex<File>) -> Result<String, LeetError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut collected = String::new();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&raw);
        let mut entry = format!("{}: {}", prefix, line);
        if !entry.ends_with('\n') {
            entry.push('\n');
        }
        {
            let mut file = log.lock().await;
            file.write_all(entry.as_bytes()).await?;
            file.flush().await?;
        }
        collected.push_str(&line);
    }
    Ok(collected)
}
