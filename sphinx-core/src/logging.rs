//! Structured logging setup using the `tracing` ecosystem.
//!
//! Console output goes to stderr; file output rotates daily and can be
//! written as JSON lines.

use std::path::Path;

use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::constants::LOG_FILE_NAME;
use crate::error::{SphinxError, SphinxResult};

/// Install the global tracing subscriber.
///
/// `config.level` accepts anything `EnvFilter` understands, e.g. `"info"` or
/// `"sphinx_socket=debug,info"`. An unparsable filter falls back to `info`.
pub fn init_logging(config: &LoggingConfig, log_dir: &Path) -> SphinxResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_NAME));

    let console_layer = fmt::layer().with_target(true).compact();

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let registry = tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(console_layer);

    let result = if config.json_output {
        registry.with(file_layer.json().with_thread_ids(true)).try_init()
    } else {
        registry.with(file_layer).try_init()
    };
    result.map_err(|e| SphinxError::Internal(format!("failed to install subscriber: {e}")))?;

    tracing::info!(
        level = %config.level,
        dir = %log_dir.display(),
        "logging initialized"
    );

    Ok(LogGuard { _guard: guard })
}

/// Keeps the non-blocking file writer alive. Dropping it flushes the log file.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Console-only logger for tests and small tools. Repeated calls are no-ops.
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(fmt::layer().with_target(true).compact())
        .try_init();
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
