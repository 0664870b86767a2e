//! Layered configuration
//!
//! Defaults, then `config.toml` in the user config directory, then
//! environment variables. The CLI applies its flags on top.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const CONFIG_DIR_NAME: &str = "venv-formula";

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigToml {
    prefix: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    formula_dir: Option<PathBuf>,
    http_timeout_secs: Option<u64>,
}

impl ConfigToml {
    fn merge(&mut self, other: ConfigToml) {
        if other.prefix.is_some() {
            self.prefix = other.prefix;
        }
        if other.cache_dir.is_some() {
            self.cache_dir = other.cache_dir;
        }
        if other.formula_dir.is_some() {
            self.formula_dir = other.formula_dir;
        }
        if other.http_timeout_secs.is_some() {
            self.http_timeout_secs = other.http_timeout_secs;
        }
    }

    fn from_env() -> Self {
        Self {
            prefix: std::env::var_os("FORMULA_PREFIX").map(PathBuf::from),
            cache_dir: std::env::var_os("FORMULA_CACHE").map(PathBuf::from),
            formula_dir: std::env::var_os("FORMULA_PATH").map(PathBuf::from),
            http_timeout_secs: std::env::var("FORMULA_HTTP_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Installation root; kegs live under `<prefix>/Cellar`
    pub prefix: PathBuf,
    /// Download cache
    pub cache_dir: PathBuf,
    /// Where formula files are looked up by name
    pub formula_dir: PathBuf,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let data_home = dirs::data_dir().unwrap_or_else(|| PathBuf::from(".local/share"));
        let cache_home = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        Self {
            prefix: data_home.join(CONFIG_DIR_NAME),
            cache_dir: cache_home.join(CONFIG_DIR_NAME).join("downloads"),
            formula_dir: PathBuf::from("Formula"),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load defaults, the user config file (if present) and the environment.
    pub fn load() -> Result<Self> {
        let file = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.toml"));
        Self::load_from(file.as_deref())
    }

    /// Same as [`Config::load`] with an explicit config file location.
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let mut layered = ConfigToml::default();
        if let Some(path) = file.filter(|p| p.exists()) {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let parsed: ConfigToml = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            layered.merge(parsed);
        }
        layered.merge(ConfigToml::from_env());
        Ok(Self::default().apply(layered))
    }

    fn apply(mut self, layered: ConfigToml) -> Self {
        if let Some(prefix) = layered.prefix {
            self.prefix = prefix;
        }
        if let Some(cache_dir) = layered.cache_dir {
            self.cache_dir = cache_dir;
        }
        if let Some(formula_dir) = layered.formula_dir {
            self.formula_dir = formula_dir;
        }
        if let Some(secs) = layered.http_timeout_secs {
            self.http_timeout = clamp_timeout(secs);
        }
        self
    }

    /// Directory holding every installed keg
    pub fn cellar(&self) -> PathBuf {
        self.prefix.join("Cellar")
    }
}

/// Clamp to a reasonable range (5-300 seconds)
pub fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(5, 300))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.cellar().ends_with("Cellar"));
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "prefix = \"/opt/formula\"\nhttp_timeout_secs = 1000\n",
        )
        .unwrap();

        let mut layered = ConfigToml::default();
        layered.merge(toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap());
        let config = Config::default().apply(layered);

        assert_eq!(config.prefix, PathBuf::from("/opt/formula"));
        assert_eq!(config.http_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut base = ConfigToml {
            cache_dir: Some(PathBuf::from("/cache")),
            ..Default::default()
        };
        base.merge(ConfigToml {
            prefix: Some(PathBuf::from("/prefix")),
            ..Default::default()
        });
        assert_eq!(base.cache_dir, Some(PathBuf::from("/cache")));
        assert_eq!(base.prefix, Some(PathBuf::from("/prefix")));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "prefix = [").unwrap();
        assert!(Config::load_from(Some(&path)).is_err());
    }

    #[test]
    fn test_timeout_clamped() {
        assert_eq!(clamp_timeout(0), Duration::from_secs(5));
        assert_eq!(clamp_timeout(60), Duration::from_secs(60));
    }
}
