//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` wins over `log_level` when set.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_appender = log_dir.and_then(|dir| {
        let log_path = Path::new(dir);
        if log_path.exists() || std::fs::create_dir_all(log_path).is_ok() {
            Some(tracing_appender::rolling::daily(log_path, "cafe-server"))
        } else {
            None
        }
    });

    // try_init: a second call (tests, embedding) keeps the first subscriber
    match (file_appender, json.unwrap_or(false)) {
        (Some(appender), true) => {
            let _ = builder.json().with_writer(appender).try_init();
        }
        (Some(appender), false) => {
            let _ = builder.with_ansi(false).with_writer(appender).try_init();
        }
        (None, true) => {
            let _ = builder.json().try_init();
        }
        (None, false) => {
            let _ = builder.try_init();
        }
    }
}
