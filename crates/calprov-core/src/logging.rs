//! Logging bootstrap.
//!
//! Every client operation logs its attempt and outcome; this module routes
//! those events to the console and, when configured, to a plain-text log file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;
use crate::error::ConfigError;

/// Keeps the file writer alive. Dropping it flushes buffered log lines.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize the tracing subscriber with a console layer and an optional
/// file layer.
///
/// `RUST_LOG` takes precedence over `settings.level`. Calling this twice is
/// harmless: the second subscriber is simply not installed.
pub fn init(settings: &LoggingSettings) -> Result<LogGuard, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| ConfigError::Invalid(format!("logging.level: {}", e)))?;

    let (file_layer, guard) = match &settings.file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init();

    if result.is_ok() {
        tracing::info!("Logging initialized at level: {}", settings.level);
    }

    Ok(LogGuard { _file: guard })
}

fn file_writer(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), ConfigError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ConfigError::Invalid(format!("logging.file: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
