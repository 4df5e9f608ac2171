//! Runtime configuration, read from a RON file.
//!
//! Every field has a default, so an empty file (or no file) is a valid config.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use recall_engine::{RetrieveSettings, SelectorTable};
use recall_logging::recall_info;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    pub api_base_url: String,
    pub top_k: u32,
    pub poll_interval_ms: u64,
    pub navigation_interval_ms: u64,
    pub suggestion_ttl_ms: u64,
    pub suggestion_fade_ms: u64,
    pub notification_ttl_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// JSON file holding `idToken` and `expiresAt`.
    pub credentials_path: PathBuf,
    pub selectors: SelectorTable,
}

impl Default for RecallConfig {
    fn default() -> Self {
        let retrieve = RetrieveSettings::default();
        Self {
            api_base_url: retrieve.api_base_url,
            top_k: retrieve.top_k,
            poll_interval_ms: 2000,
            navigation_interval_ms: 1000,
            suggestion_ttl_ms: 15_000,
            suggestion_fade_ms: 2000,
            notification_ttl_ms: 3000,
            connect_timeout_ms: duration_ms(retrieve.connect_timeout),
            request_timeout_ms: duration_ms(retrieve.request_timeout),
            credentials_path: PathBuf::from("auth.json"),
            selectors: SelectorTable::default(),
        }
    }
}

/// Timer periods used by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub poll_interval: Duration,
    pub navigation_interval: Duration,
    pub suggestion_ttl: Duration,
    pub suggestion_fade: Duration,
    pub notification_ttl: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        RecallConfig::default().timings()
    }
}

impl RecallConfig {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                recall_info!("No config at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        recall_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn retrieve_settings(&self) -> RetrieveSettings {
        RetrieveSettings {
            api_base_url: self.api_base_url.clone(),
            top_k: self.top_k,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..RetrieveSettings::default()
        }
    }

    pub fn timings(&self) -> Timings {
        Timings {
            // A zero period would make the interval timer panic.
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            navigation_interval: Duration::from_millis(self.navigation_interval_ms.max(1)),
            suggestion_ttl: Duration::from_millis(self.suggestion_ttl_ms),
            suggestion_fade: Duration::from_millis(self.suggestion_fade_ms),
            notification_ttl: Duration::from_millis(self.notification_ttl_ms),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::{ConfigError, RecallConfig};

    #[test]
    fn missing_file_means_defaults() {
        let dir = TempDir::new().unwrap();
        let config = RecallConfig::load(&dir.path().join("recall.ron")).unwrap();
        assert_eq!(config, RecallConfig::default());
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("recall.ron");
        fs::write(
            &path,
            r#"(api_base_url: "https://memories.example.com", poll_interval_ms: 500)"#,
        )
        .unwrap();

        let config = RecallConfig::load(&path).unwrap();
        assert_eq!(config.api_base_url, "https://memories.example.com");
        assert_eq!(config.timings().poll_interval, Duration::from_millis(500));
        assert_eq!(config.timings().suggestion_ttl, Duration::from_secs(15));
        assert_eq!(config.selectors, RecallConfig::default().selectors);
    }

    #[test]
    fn selector_overrides_are_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("recall.ron");
        fs::write(&path, r#"(selectors: (message_bubbles: [".bubble"]))"#).unwrap();

        let config = RecallConfig::load(&path).unwrap();
        assert_eq!(config.selectors.message_bubbles, vec![".bubble".to_string()]);
        assert!(!config.selectors.text_inputs.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("recall.ron");
        fs::write(&path, "(top_k: \"five\")").unwrap();
        assert!(matches!(
            RecallConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn settings_carry_timeouts() {
        let config = RecallConfig {
            request_timeout_ms: 1500,
            ..RecallConfig::default()
        };
        let settings = config.retrieve_settings();
        assert_eq!(settings.request_timeout, Duration::from_millis(1500));
        assert_eq!(settings.endpoint_path, "/api/memories/retrieve-answer/");
    }
}
