mod bytesize;
mod config;
mod mux;
mod quota;
mod supervisor;

use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Run a command, mirror its stdout/stderr to the terminal in real time,
/// and keep a size-capped copy of both streams (merged) in a log file.
/// Exits with the command's own exit code.
#[derive(Parser, Debug)]
#[command(name = "logtee", version, about)]
pub struct Cli {
    /// Stop logging after this many bytes (suffix `k` or `M` allowed)
    #[arg(short = 'o', long = "limit", value_name = "BYTES")]
    limit: Option<String>,

    /// Config file with defaults (a missing file is fine)
    #[arg(short, long, default_value = "logtee.toml")]
    config: PathBuf,

    /// Extra logging (stream teardown, logger accounting)
    #[arg(short, long)]
    verbose: bool,

    /// Log file (created, truncated)
    #[arg(value_name = "LOGFILE")]
    logfile: PathBuf,

    /// Command to run, with its arguments
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<String>,
}

#[tokio::main]
async fn main() {
    // Usage errors exit 1; --help/--version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                return;
            }
            std::process::exit(1);
        }
    };

    // Diagnostics go to stderr: stdout belongs to the child's mirrored output.
    let default_level = if cli.verbose { "logtee=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("logtee: {e}");
            std::process::exit(1);
        }
    };

    let limit_str = cli.limit.or(config.log.limit);
    let limit = match &limit_str {
        Some(s) => match bytesize::parse(s) {
            Ok(n) => Some(n),
            Err(e) => {
                eprintln!("logtee: invalid byte limit {s:?}: {e}");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let (command, args) = match cli.command.split_first() {
        Some((command, args)) => (command.as_str(), args),
        None => {
            // clap's `required` should make this unreachable.
            eprintln!("logtee: missing command");
            std::process::exit(1);
        }
    };

    tracing::debug!(
        logfile = %cli.logfile.display(),
        limit = ?limit,
        chunk_size = config.log.chunk_size,
        command,
        "starting supervised run"
    );

    match supervisor::run_command(&cli.logfile, limit, command, args, config.log.chunk_size).await
    {
        Ok(outcome) => std::process::exit(outcome.code()),
        Err(e) => {
            eprintln!("logtee: {e}");
            std::process::exit(1);
        }
    }
}
