use anyhow::Context;
use glob::{glob, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// # Logging Options
///
/// Controls where log lines go and how they are formatted.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Default filter directive, used when `RUST_LOG` is not set (e.g. "info", "lib_marketdata=debug").
    pub level: String,
    /// Emit console lines as JSON objects instead of plain text.
    pub json: bool,
    /// Directory for daily rolling log files. `None` disables file output.
    pub log_dir: Option<PathBuf>,
    /// File name prefix; files are named `<prefix>.<YYYY-MM-DD>.log`.
    pub file_prefix: String,
    /// Number of log files kept in `log_dir` at startup, newest first.
    pub max_files: usize,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_dir: None,
            file_prefix: "market".to_string(),
            max_files: 7,
        }
    }
}

/// Keeps the non-blocking file writer alive. Dropping it flushes pending lines.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard {
    file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// `true` when file output is active.
    pub fn has_file_output(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `options.level` when set. Console output is always on;
/// file output is added when `options.log_dir` is set, after trimming old files
/// down to `options.max_files`.
///
/// # Errors
/// Fails on an unparsable filter, an unwritable log directory, or when a global
/// subscriber is already installed.
pub fn init_logging(options: &LoggingOptions) -> anyhow::Result<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.level))
        .with_context(|| format!("invalid log filter '{}'", options.level))?;

    let console = if options.json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let (file_layer, file_guard) = match &options.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            cleanup_old_logs(dir, &options.file_prefix, options.max_files)?;

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(&options.file_prefix)
                .filename_suffix("log")
                .build(dir)
                .with_context(|| format!("cannot open log file in {}", dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(LoggingGuard { file_guard })
}

/// Deletes all but the `keep` newest `<prefix>.*.log` files in `log_dir`.
///
/// Files are ordered by name, which sorts by date for the rolling appender's
/// naming scheme. Returns how many files were removed.
///
/// # Errors
/// Fails only if the glob pattern cannot be built from `log_dir`/`prefix`.
pub fn cleanup_old_logs(log_dir: &Path, prefix: &str, keep: usize) -> anyhow::Result<usize> {
    let pattern = format!(
        "{}/{}.*.log",
        Pattern::escape(&log_dir.display().to_string()),
        Pattern::escape(prefix)
    );
    let mut log_files: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("bad log glob pattern {}", pattern))?
        .filter_map(Result::ok)
        .collect();

    // Newest first.
    log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let mut removed = 0;
    for old_file in log_files.iter().skip(keep) {
        match fs::remove_file(old_file) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Error deleting old log file {}: {}", old_file.display(), e),
        }
    }
    Ok(removed)
}
