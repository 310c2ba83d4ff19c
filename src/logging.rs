//! Rotating log system
//!
//! Logs to both console and daily-rotating files in the log directory.
//! Per-pixel arithmetic never logs; only provider lifecycle, fallbacks and
//! render progress do, so `debug` for this crate stays readable.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Files are named tetration_math.log.YYYY-MM-DD
pub const LOG_FILE_PREFIX: &str = "tetration_math.log";

/// Used when RUST_LOG is unset or unparsable
pub const DEFAULT_FILTER: &str = "info,tetration_math=debug";

/// RUST_LOG if it parses, otherwise [`DEFAULT_FILTER`]
fn env_filter() -> (EnvFilter, bool) {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(DEFAULT_FILTER), false),
    }
}

/// Initialize console + rotating file logging
pub fn init_logging(log_dir: &str) -> std::io::Result<()> {
    // Create log directory if it doesn't exist
    std::fs::create_dir_all(Path::new(log_dir))?;

    // Rotating file appender, one file per day
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Logging lasts the whole program, so the flush guard is leaked
    std::mem::forget(guard);

    let (filter, from_env) = env_filter();

    // Console layer - source locations, no thread ids
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    // File layer - plain text with thread ids (render work runs on blocking threads)
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        log_dir,
        filter = if from_env { "RUST_LOG" } else { DEFAULT_FILTER },
        "Logging initialized"
    );
    Ok(())
}
