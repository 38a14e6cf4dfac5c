//! Tracing subscriber setup
//!
//! Terminal output always goes to stderr. With `[logging] file = true` the
//! same events are also appended to a daily rolling file,
//! `voxtap.YYYY-MM-DD.log`, under the configured log directory.

use crate::config::LoggingConfig;
use crate::error::VoxtapError;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// The returned guard flushes the log file on drop and must be held
/// until the process exits.
pub fn init(level: &str, config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("voxtap={},warn", level)));

    let mut file_error = None;
    let (file_layer, guard) = if config.file {
        match file_writer(&config.resolve_dir()) {
            Ok((writer, guard)) => (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            ),
            Err(e) => {
                file_error = Some(e);
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!("File logging disabled: {}", e);
    } else if config.file {
        tracing::debug!("Logging to {:?}", config.resolve_dir());
    }

    guard
}

/// Open a non-blocking writer over a daily rolling file in `dir`
pub fn file_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard), VoxtapError> {
    std::fs::create_dir_all(dir)?;

    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix("voxtap")
        .filename_suffix("log")
        .build(dir)
        .map_err(|e| VoxtapError::Config(format!("log directory {:?}: {}", dir, e)))?;

    Ok(tracing_appender::non_blocking(appender))
}
