//! Console configuration.
//!
//! A small JSON file (`~/.config/rescat/config.json` on most platforms) holding the
//! API base URL and the wizard behaviour switches. Missing files yield defaults; a
//! file that fails to parse is logged and replaced by defaults so the console still starts.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::expand_tilde;

/// Environment variable allowing callers to override the configuration file path.
pub const CONFIG_PATH_ENV: &str = "RESCAT_CONFIG_PATH";

/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Error surfaced when the configuration file exists but cannot be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted console settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the console backend.
    pub api_base: String,
    pub request_timeout_secs: u64,
    /// Enables the government submode with source-system requirements.
    pub government_mode: bool,
    /// Requires at least one primary key and one timestamp column.
    pub primary_required: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080".to_string(),
            request_timeout_secs: 30,
            government_mode: false,
            primary_required: false,
        }
    }
}

impl ConsoleConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Returns the configuration path, honouring `RESCAT_CONFIG_PATH`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rescat")
        .join(CONFIG_FILE_NAME)
}

/// Loads the configuration from the default path.
pub fn load_config() -> Result<ConsoleConfig, ConfigError> {
    load_config_from_path(&default_config_path())
}

/// Loads the configuration from `path`.
pub fn load_config_from_path(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded console config");
                Ok(config)
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse console config; using defaults"
                );
                Ok(ConsoleConfig::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(ConsoleConfig::default()),
        Err(error) => Err(ConfigError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_honors_environment_override() {
        let override_path = "~/custom/rescat/config.json";
        temp_env::with_var(CONFIG_PATH_ENV, Some(override_path), || {
            assert_eq!(default_config_path(), expand_tilde(override_path));
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config_from_path(&dir.path().join("absent.json")).expect("load");
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "government_mode": true }"#).expect("write config");

        let config = load_config_from_path(&path).expect("load");
        assert!(config.government_mode);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").expect("write config");

        assert_eq!(load_config_from_path(&path).expect("load"), ConsoleConfig::default());
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let config = ConsoleConfig {
            request_timeout_secs: 0,
            ..ConsoleConfig::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
