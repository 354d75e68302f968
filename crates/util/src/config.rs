//! Application configuration.
//!
//! Read from `RESULTGRID_CONFIG_PATH` or `<config_dir>/resultgrid/config.json`.
//! Every field is optional; anything missing keeps its default, so a file
//! holding only `{"page_size": 50}` is valid.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use resultgrid_engine::TabularOptions;
pub use resultgrid_types::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::path_processing::{app_file_path, expand_tilde};

pub const CONFIG_PATH_ENV: &str = "RESULTGRID_CONFIG_PATH";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Job service URL; `RESULTGRID_API_BASE` still takes precedence.
    pub api_base_url: Option<String>,
    pub page_size: usize,
    pub poll_interval_ms: u64,
    pub tabular: TabularOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            tabular: TabularOptions::default(),
        }
    }
}

impl AppConfig {
    /// Loads from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => expand_tilde(&path.to_string_lossy()),
            None => default_config_path(),
        };
        Self::load_from(&path)
    }

    /// A missing file yields the defaults; unreadable or malformed files are errors.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

pub fn default_config_path() -> PathBuf {
    app_file_path(CONFIG_PATH_ENV, CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use resultgrid_engine::NumberLocale;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.page_size, 25);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"api_base_url": "http://intranet:8001", "tabular": {"format": {"locale": "en-US"}, "export": {"delimiter": ";"}}}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("http://intranet:8001"));
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.tabular.format.locale, NumberLocale::EnUs);
        assert_eq!(config.tabular.format.decimal_fraction_digits, 4);
        assert_eq!(config.tabular.export.delimiter, ';');
        assert_eq!(config.tabular.columns.max_columns, 80);
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();
        let error = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().contains("config.json"), "{error}");
    }

    #[test]
    fn env_override_selects_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{"page_size": 50, "poll_interval_ms": 500}"#).unwrap();
        temp_env::with_var(CONFIG_PATH_ENV, Some(path.as_os_str()), || {
            let config = AppConfig::load(None).unwrap();
            assert_eq!(config.page_size, 50);
            assert_eq!(config.poll_interval(), Duration::from_millis(500));
        });
    }
}
