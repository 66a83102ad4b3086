//! Logging setup for the renderer and its command line.
//!
//! - Writes to `<log dir>/maprender.log`, truncated when a session starts
//! - Mirrors events to stderr so stdout stays free for rendered output
//! - Filter taken from `RUST_LOG` when set

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the file writer alive; dropping it flushes the log.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initializes the global subscriber.
///
/// `default_level` applies when `RUST_LOG` is unset.
///
/// # Errors
///
/// Fails when the log directory cannot be created or the file cannot be
/// truncated.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    default_level: &str,
) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .pretty();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Creates the log directory and empties the log file.
pub fn prepare_log_file(log_dir: &Path, log_file: &str) -> Result<PathBuf, io::Error> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(log_file);
    fs::write(&log_path, "")?;
    Ok(log_path)
}

/// Filter level used without `RUST_LOG`.
pub fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

pub fn default_log_dir() -> PathBuf {
    crate::config::default_log_directory()
}

pub fn default_log_file() -> &'static str {
    crate::config::DEFAULT_LOG_FILE
}
