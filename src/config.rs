use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.beacondb.net/v1/geolocate";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    pub authorization_ms: u64,
    pub position_ms: u64,
    pub poll_quantum_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        TimeoutConfig {
            authorization_ms: 10_000,
            position_ms: 20_000,
            poll_quantum_ms: 100,
        }
    }
}

impl TimeoutConfig {
    pub fn authorization(&self) -> Duration {
        Duration::from_millis(self.authorization_ms)
    }

    pub fn position(&self) -> Duration {
        Duration::from_millis(self.position_ms)
    }

    /// Never zero, so a poll loop always makes progress.
    pub fn poll_quantum(&self) -> Duration {
        Duration::from_millis(self.poll_quantum_ms.max(1))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    /// `false` puts location access in the Restricted state.
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub refinements: u32,
    pub request_timeout_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            refinements: 2,
            request_timeout_ms: 5_000,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Like [`Config::load_from`], but a broken file falls back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let loaded = match path {
            Some(p) => Self::load_from(p),
            None => Self::load(),
        };

        loaded.unwrap_or_else(|e| {
            log::warn!("{:#}; using defaults", e);
            Config::default()
        })
    }
}

/// Values taken from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub debug: bool,
    pub output_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("DEBUG").ok(),
            std::env::var_os("OUTPUT_FILE").map(PathBuf::from),
        )
    }

    pub fn from_vars(debug: Option<String>, output_file: Option<PathBuf>) -> Self {
        Settings {
            debug: debug.is_some_and(|v| !v.is_empty()),
            output_file: output_file.filter(|p| !p.as_os_str().is_empty()),
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?;
    Ok(config_dir.join("wifi-locate"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.timeouts.position() > cfg.timeouts.authorization());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[timeouts]\nposition_ms = 500\n\n[location]\nenabled = false\napi_key = \"abc\"\n",
        )
        .unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.timeouts.position_ms, 500);
        assert_eq!(cfg.timeouts.authorization_ms, 10_000);
        assert!(!cfg.location.enabled);
        assert_eq!(cfg.location.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.location.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[timeouts\nnot toml").unwrap();

        assert!(Config::load_from(&path).is_err());
        assert_eq!(Config::load_or_default(Some(&path)), Config::default());
    }

    #[test]
    fn test_zero_quantum_is_clamped() {
        let timeouts = TimeoutConfig {
            poll_quantum_ms: 0,
            ..TimeoutConfig::default()
        };
        assert_eq!(timeouts.poll_quantum(), Duration::from_millis(1));
    }

    #[test]
    fn test_settings_treat_empty_values_as_unset() {
        let s = Settings::from_vars(Some(String::new()), Some(PathBuf::new()));
        assert!(!s.debug);
        assert!(s.output_file.is_none());

        let s = Settings::from_vars(Some("1".into()), Some(PathBuf::from("/tmp/out.txt")));
        assert!(s.debug);
        assert_eq!(s.output_file, Some(PathBuf::from("/tmp/out.txt")));
    }
}
