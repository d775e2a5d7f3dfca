//! Console and per-run file logging.
//!
//! The console shows warnings (everything with `-v`). A scrape also writes
//! INFO and above to `<log_dir>/culturecircle_scraper_<timestamp>.log`, which
//! keeps scroll counts and image failures after a headless run ends.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// File name of the log for a run started at `timestamp`.
pub fn log_file_name(timestamp: &str) -> String {
    format!("culturecircle_scraper_{}.log", timestamp)
}

/// INFO-level layer writing to a fresh file under `dir`.
///
/// The guard flushes the background writer on drop and must outlive the run.
pub fn file_layer<S>(
    dir: &Path,
    timestamp: &str,
) -> Result<(impl Layer<S> + Send + Sync + 'static, WorkerGuard, PathBuf)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let name = log_file_name(timestamp);
    let (writer, guard) = non_blocking(rolling::never(dir, &name));

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(LevelFilter::INFO);

    Ok((layer, guard, dir.join(name)))
}

/// Installs the global subscriber. With `log_file` set, also returns the file
/// guard and path.
pub fn init(
    verbose: bool,
    log_file: Option<(&Path, &str)>,
) -> Result<Option<(WorkerGuard, PathBuf)>> {
    let console_filter = if verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    match log_file {
        Some((dir, timestamp)) => {
            let (file, guard, path) = file_layer(dir, timestamp)?;
            tracing_subscriber::registry().with(console).with(file).init();
            Ok(Some((guard, path)))
        }
        None => {
            tracing_subscriber::registry().with(console).init();
            Ok(None)
        }
    }
}
