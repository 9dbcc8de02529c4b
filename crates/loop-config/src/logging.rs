//! Logging initialization.
//!
//! Thin wrapper over the `observability` crate so binaries configure logging
//! the same way everywhere.

use crate::Paths;
use observability::LogConfig;

/// Initialize logging for a service.
///
/// Structured JSONL goes to `paths.log_file()`; `RUST_LOG` overrides
/// `level`. With `also_stderr` a compact copy is printed for foreground use.
pub fn init_logging(service_name: &str, level: &str, paths: &Paths, also_stderr: bool) {
    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
