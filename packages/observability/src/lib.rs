//! # Observability
//!
//! Centralized logging for the Loop Social client core.
//!
//! Crates in this workspace are **log producers** only. The binary calls
//! `observability::init_with_config()` once at startup and every other crate
//! uses plain `tracing` macros. No library crate knows where logs end up.
//!
//! ## Output
//!
//! Every event is written as one JSON line to a central file, by default
//! `~/.loop-social/logs/dev.jsonl`, so the stream can be followed with
//! `tail -f ~/.loop-social/logs/dev.jsonl | jq`. A compact human-readable
//! copy can additionally be sent to stderr.
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "loop-cli".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! tracing::info!("ready");
//! ```

mod dev;
mod json_layer;

use std::path::PathBuf;

pub use json_layer::LogEntry;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "loop-cli").
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.loop-social/logs/dev.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings.
///
/// ```rust,ignore
/// observability::init("loop-cli");
/// ```
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Falls back to a stderr-only subscriber when the central log file cannot
/// be opened. Calling this more than once is a no-op after the first call.
pub fn init_with_config(config: LogConfig) {
    dev::init_subscriber(&config);
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
