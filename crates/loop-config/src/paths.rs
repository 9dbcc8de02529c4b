//! File system paths for the client.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name under the user's home.
const BASE_DIR_NAME: &str = ".loop-social";

/// Manages file system paths for the client.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for client files (~/.loop-social)
    base_dir: PathBuf,
}

impl Paths {
    /// Paths rooted at `~/.loop-social`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.loop-social).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.loop-social/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Local key-value store backing the session mirror and provider tokens
    /// (~/.loop-social/store.json).
    pub fn store_file(&self) -> PathBuf {
        self.base_dir.join("store.json")
    }

    /// Get the logs directory (~/.loop-social/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Central JSONL log (~/.loop-social/logs/dev.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("dev.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
