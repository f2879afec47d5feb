//! Log routing for the `trove` binary.
//!
//! Search output owns stdout, so human-facing logs go to stderr at the level
//! chosen with `--log-level`. Every event, down to provider request details,
//! is also kept in a per-run file that the next run overwrites.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Name of the trace file kept for the most recent run.
pub const LAST_RUN_LOG: &str = "trove-last-run.log";

/// Installs the global subscriber and returns the trace file path.
///
/// `RUST_LOG` overrides `console_level` for stderr. The trace file under
/// `logs_dir` (default `./logs`) always records at `trace`.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - The logs directory or trace file could not be
///   created, or another subscriber is already installed
pub fn init_tracing(
    console_level: Level,
    logs_dir: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(dir)?;

    let trace_path = dir.join(LAST_RUN_LOG);
    let trace_file = File::create(&trace_path)?;

    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    let trace_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(trace_file)
        .with_filter(EnvFilter::new("trace"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(trace_layer)
        .try_init()?;

    tracing::debug!(
        "Logging to stderr at {console_level}, full trace in {}",
        trace_path.display()
    );

    Ok(trace_path)
}

/// Value of the global `--log-level` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    Error,
    /// Default: only degraded providers and failures
    Warn,
    /// Adds fallbacks and retries
    Info,
    /// Adds every outgoing provider request
    Debug,
    Trace,
}

impl CliLogLevel {
    /// ```
    /// use trove_core::CliLogLevel;
    ///
    /// assert_eq!(CliLogLevel::Info.as_tracing_level(), tracing::Level::INFO);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CliLogLevel::Error => "error",
            CliLogLevel::Warn => "warn",
            CliLogLevel::Info => "info",
            CliLogLevel::Debug => "debug",
            CliLogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}
