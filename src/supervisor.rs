/// Child supervision: spawn the command with piped stdout/stderr, run the
/// logger task that multiplexes both streams to the terminal and the log
/// file, wait for child and logger in whichever order they finish, and
/// decode the exit status.
use crate::mux::{self, Channel, MuxStats};
use crate::quota::QuotaGate;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc;

/// How a supervised task finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with a code.
    Exited(i32),
    /// Terminated by a signal.
    Signaled(i32),
    /// Neither exited nor signaled (raw wait status).
    Unknown(i32),
}

impl ExitOutcome {
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            ExitOutcome::Exited(code)
        } else if let Some(sig) = status.signal() {
            ExitOutcome::Signaled(sig)
        } else {
            ExitOutcome::Unknown(status.into_raw())
        }
    }

    /// Shell-style numeric exit code: the code itself for a normal exit,
    /// `128 + signal` for a signal death. Non-zero for anything abnormal.
    pub fn code(&self) -> i32 {
        match self {
            ExitOutcome::Exited(code) => *code,
            ExitOutcome::Signaled(sig) => 128 + sig,
            ExitOutcome::Unknown(raw) => *raw,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Exited(0))
    }

    /// Human line for diagnostics: `name: exit N`,
    /// `name: signal SIGTERM (15)`, or `name: status N`.
    pub fn describe(&self, name: &str) -> String {
        match self {
            ExitOutcome::Exited(code) => format!("{name}: exit {code}"),
            ExitOutcome::Signaled(sig) => match nix::sys::signal::Signal::try_from(*sig) {
                Ok(signal) => format!("{name}: signal {} ({sig})", signal.as_str()),
                Err(_) => format!("{name}: signal {sig}"),
            },
            ExitOutcome::Unknown(raw) => format!("{name}: status {raw}"),
        }
    }
}

/// Errors that make the whole run fail before or outside the child itself.
/// None of these are retried.
#[derive(Debug)]
pub enum RunError {
    /// Failed to create/truncate the log file.
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to spawn the command.
    Spawn {
        command: String,
        source: std::io::Error,
    },
    /// The spawned child came back without piped output handles.
    Pipes { command: String },
    /// Waiting on the child failed.
    Wait { source: std::io::Error },
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::LogFile { path, source } => {
                write!(f, "failed to create log file {}: {}", path.display(), source)
            }
            RunError::Spawn { command, source } => write!(f, "{command}: {source}"),
            RunError::Pipes { command } => {
                write!(f, "{command}: child stdout/stderr not piped")
            }
            RunError::Wait { source } => write!(f, "wait: {source}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::LogFile { source, .. } => Some(source),
            RunError::Spawn { source, .. } => Some(source),
            RunError::Pipes { .. } => None,
            RunError::Wait { source } => Some(source),
        }
    }
}

/// Run `command args...` with stdout/stderr teed to the terminal and a
/// quota-capped log at `log_path`. Returns the child's decoded outcome
/// after the logger has fully drained both streams.
///
/// Stdin is left attached to the caller's terminal. The child's non-zero
/// outcome is printed to stderr here; turning it into a process exit code
/// is the caller's job.
pub async fn run_command(
    log_path: &Path,
    limit: Option<u64>,
    command: &str,
    args: &[String],
    chunk_size: usize,
) -> Result<ExitOutcome, RunError> {
    // Create/truncate the log up front: no child runs if we cannot log.
    let log_file = std::fs::File::create(log_path).map_err(|e| RunError::LogFile {
        path: log_path.to_path_buf(),
        source: e,
    })?;

    let mut child = Command::new(command)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RunError::Spawn {
            command: command.to_string(),
            source: e,
        })?;

    tracing::debug!(pid = ?child.id(), command, "child spawned");

    let stdout = child.stdout.take().ok_or_else(|| RunError::Pipes {
        command: command.to_string(),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| RunError::Pipes {
        command: command.to_string(),
    })?;

    // One reader task per stream; dropping a sender marks that stream
    // closed, and the logger ends once both are gone.
    let (tx, rx) = mpsc::channel(16);
    let tx_err = tx.clone();
    tokio::spawn(mux::pump_channel(stdout, Channel::Stdout, tx, chunk_size));
    tokio::spawn(mux::pump_channel(stderr, Channel::Stderr, tx_err, chunk_size));

    let mut logger = tokio::spawn(async move {
        let mut term_out = tokio::io::stdout();
        let mut term_err = tokio::io::stderr();
        let mut log = tokio::fs::File::from_std(log_file);
        let mut quota = QuotaGate::new(limit);
        mux::run_multiplexer(rx, &mut term_out, &mut term_err, &mut log, &mut quota).await
    });

    // Wait for {child, logger} in arrival order. Normally the child exits
    // first and the logger follows once the pipes hit EOF, but a child
    // that closes its output streams and keeps running flips the order.
    let outcome = tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|e| RunError::Wait { source: e })?;
            report_logger(logger.await);
            ExitOutcome::from_status(status)
        }
        logger_result = &mut logger => {
            report_logger(logger_result);
            let status = child.wait().await.map_err(|e| RunError::Wait { source: e })?;
            ExitOutcome::from_status(status)
        }
    };

    if !outcome.is_success() {
        eprintln!("{}", outcome.describe(command));
    }
    Ok(outcome)
}

/// The logger's own outcome: drained cleanly, failed to flush the log, or
/// died as a task. Only abnormal endings get a stderr line, named "logger"
/// to tell them apart from the child.
fn report_logger(result: Result<std::io::Result<MuxStats>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(stats)) => {
            tracing::debug!(
                bytes_seen = stats.bytes_seen,
                bytes_logged = stats.bytes_logged,
                "logger drained"
            );
        }
        Ok(Err(e)) => eprintln!("logger: {e}"),
        Err(e) => eprintln!("logger: {e}"),
    }
}
