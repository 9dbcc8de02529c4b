//! Configuration management.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// Default Supabase URL (can be overridden at compile time via SUPABASE_URL env var).
pub const DEFAULT_SUPABASE_URL: &str = match option_env!("SUPABASE_URL") {
    Some(url) => url,
    None => "https://xyzcompany.supabase.co",
};

/// Default Supabase anon key (can be overridden at compile time via SUPABASE_ANON_KEY env var).
pub const DEFAULT_SUPABASE_ANON_KEY: &str = match option_env!("SUPABASE_ANON_KEY") {
    Some(key) => key,
    None => "demo-anon-key",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Where screen data comes from.
///
/// `Live` talks to Supabase and reports empty results and failures as they
/// are. `Demo` serves the built-in fixture set from memory and never touches
/// the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    #[default]
    Live,
    Demo,
}

impl FromStr for DataMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(DataMode::Live),
            "demo" | "offline" => Ok(DataMode::Demo),
            other => Err(CoreError::Config(format!("unknown data mode: {other}"))),
        }
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataMode::Live => f.write_str("live"),
            DataMode::Demo => f.write_str("demo"),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Supabase project URL.
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    /// Supabase anon API key (public, safe to expose).
    #[serde(default = "default_supabase_anon_key")]
    pub supabase_anon_key: String,
    /// Live backend or built-in demo data.
    #[serde(default)]
    pub data_mode: DataMode,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.to_string()
}

fn default_supabase_anon_key() -> String {
    DEFAULT_SUPABASE_ANON_KEY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            supabase_url: default_supabase_url(),
            supabase_anon_key: default_supabase_anon_key(),
            data_mode: DataMode::default(),
        }
    }
}

impl Config {
    /// Load from the config file if present, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) -> CoreResult<()> {
        if let Some(level) = env_value("LOOP_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = env_value("LOOP_SUPABASE_URL") {
            self.supabase_url = url;
        }
        if let Some(key) = env_value("LOOP_SUPABASE_ANON_KEY") {
            self.supabase_anon_key = key;
        }
        if let Some(mode) = env_value("LOOP_DATA_MODE") {
            self.data_mode = mode.parse()?;
        }
        Ok(())
    }

    /// Get the Supabase URL as a parsed URL.
    pub fn supabase_url(&self) -> CoreResult<Url> {
        Url::parse(&self.supabase_url).map_err(CoreError::from)
    }

    /// Supabase base URL without a trailing slash, validated.
    pub fn supabase_base_url(&self) -> CoreResult<String> {
        self.supabase_url()?;
        Ok(self.supabase_url.trim_end_matches('/').to_string())
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.supabase_url, DEFAULT_SUPABASE_URL);
        assert_eq!(config.supabase_anon_key, DEFAULT_SUPABASE_ANON_KEY);
        assert_eq!(config.data_mode, DataMode::Live);
    }

    #[test]
    fn test_config_load_from_file_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        std::fs::write(&config_path, r#"{ "log_level": "debug", "data_mode": "demo" }"#).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.data_mode, DataMode::Demo);
        assert_eq!(config.supabase_url, DEFAULT_SUPABASE_URL);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            supabase_url: "https://abc123.supabase.co".to_string(),
            data_mode: DataMode::Demo,
            ..Config::default()
        };
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded.supabase_url, "https://abc123.supabase.co");
        assert_eq!(loaded.data_mode, DataMode::Demo);
    }

    #[test]
    fn test_config_supabase_url_parse() {
        let config = Config::default();
        let url = config.supabase_url().unwrap();
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_config_invalid_url() {
        let config = Config {
            supabase_url: "not a valid url".to_string(),
            ..Config::default()
        };
        assert!(config.supabase_url().is_err());
        assert!(config.supabase_base_url().is_err());
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let config = Config {
            supabase_url: "https://abc123.supabase.co/".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.supabase_base_url().unwrap(),
            "https://abc123.supabase.co"
        );
    }

    #[test]
    fn test_data_mode_parse() {
        assert_eq!("live".parse::<DataMode>().unwrap(), DataMode::Live);
        assert_eq!(" Demo ".parse::<DataMode>().unwrap(), DataMode::Demo);
        assert_eq!("offline".parse::<DataMode>().unwrap(), DataMode::Demo);
        assert!("sometimes".parse::<DataMode>().is_err());
        assert_eq!(DataMode::Demo.to_string(), "demo");
    }
}
