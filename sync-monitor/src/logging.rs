//! Tracing setup: console output plus an optional rotated log file.
//!
//! Diagnostics go to stderr so that stdout carries only reporter lines. When a
//! log directory is configured, each run writes `run.log`; the previous run's
//! file is archived under a timestamped name and old archives are pruned.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{LoggingError, LoggingResult};

/// Prefix for archived log files.
const LOG_FILE_PREFIX: &str = "sync-monitor.";
/// Name of the active log file.
const ACTIVE_LOG_NAME: &str = "run.log";
/// Archives kept when none is configured.
pub const DEFAULT_MAX_LOG_FILES: usize = 10;

/// Keeps the file writer alive; buffered entries are flushed when dropped.
#[derive(Debug)]
pub struct LoggingGuard {
    _worker_guard: Option<WorkerGuard>,
}

/// Configuration for logging output.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter. If None, `RUST_LOG` is consulted, falling back to INFO.
    pub level: Option<LevelFilter>,
    /// Whether to output logs to stderr.
    pub console: bool,
    /// Optional file logging configuration.
    pub file: Option<LogFileConfig>,
}

/// Configuration for log file output.
#[derive(Debug, Clone)]
pub struct LogFileConfig {
    /// Directory where log files will be stored.
    pub log_dir: PathBuf,
    /// Maximum number of archived log files to keep.
    pub max_files: usize,
}

impl LogFileConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }
}

/// Parse a `--log-level` value.
pub fn parse_level(level: &str) -> LoggingResult<LevelFilter> {
    level
        .parse::<LevelFilter>()
        .map_err(|e| LoggingError::SubscriberInit(format!("invalid log level '{}': {}", level, e)))
}

/// Initialize the global tracing subscriber.
///
/// With neither console nor file output enabled, nothing is installed and the
/// tracing macros are no-ops.
pub fn init_logging(config: LoggingConfig) -> LoggingResult<LoggingGuard> {
    if !config.console && config.file.is_none() {
        return Ok(LoggingGuard {
            _worker_guard: None,
        });
    }

    let env_filter = match config.level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LevelFilter::INFO.to_string())),
    };

    let (file_layer, guard) = match config.file {
        Some(ref file_config) => {
            let (writer, guard) = open_log_file(file_config)?;
            let layer = fmt::layer().with_target(true).with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer =
        config.console.then(|| fmt::layer().with_target(true).with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| LoggingError::SubscriberInit(e.to_string()))?;

    Ok(LoggingGuard {
        _worker_guard: guard,
    })
}

/// Archive the previous run's log, prune old archives and open a fresh `run.log`.
fn open_log_file(config: &LogFileConfig) -> LoggingResult<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(&config.log_dir)?;
    archive_previous_log(&config.log_dir)?;
    prune_archives(&config.log_dir, config.max_files)?;

    let file = File::create(config.log_dir.join(ACTIVE_LOG_NAME))?;
    Ok(tracing_appender::non_blocking(file))
}

/// Rename an existing `run.log` to `sync-monitor.YYYY-MM-DD.HHMMSS.log`.
///
/// The timestamp is the file's modification time; a numeric suffix resolves collisions.
fn archive_previous_log(log_dir: &Path) -> LoggingResult<()> {
    let active = log_dir.join(ACTIVE_LOG_NAME);
    if !active.exists() {
        return Ok(());
    }

    let modified: DateTime<Local> = fs::metadata(&active)
        .and_then(|meta| meta.modified())
        .map(DateTime::from)
        .unwrap_or_else(|_| Local::now());
    let stamp = modified.format("%Y-%m-%d.%H%M%S").to_string();

    let target = std::iter::once(format!("{}{}.log", LOG_FILE_PREFIX, stamp))
        .chain((1..=999).map(|i| format!("{}{}-{}.log", LOG_FILE_PREFIX, stamp, i)))
        .map(|name| log_dir.join(name))
        .find(|path| !path.exists())
        .ok_or_else(|| {
            LoggingError::RotationFailed("too many log files with same timestamp".to_string())
        })?;

    fs::rename(&active, &target).map_err(|e| LoggingError::RotationFailed(e.to_string()))
}

fn is_archive(name: &str) -> bool {
    name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log")
}

/// Delete the oldest archives until at most `max_files` remain. `run.log` is never touched.
fn prune_archives(log_dir: &Path, max_files: usize) -> LoggingResult<()> {
    let mut archives: Vec<_> = fs::read_dir(log_dir)
        .map_err(|e| LoggingError::RotationFailed(format!("failed to read log dir: {}", e)))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_str().map(is_archive).unwrap_or(false))
        .collect();

    if archives.len() <= max_files {
        return Ok(());
    }

    archives.sort_by_key(|entry| entry.metadata().and_then(|m| m.modified()).ok());

    let excess = archives.len() - max_files;
    for entry in archives.into_iter().take(excess) {
        if let Err(e) = fs::remove_file(entry.path()) {
            tracing::warn!("Failed to remove old log file {:?}: {}", entry.path(), e);
        }
    }

    Ok(())
}
