use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::error::ConfigError;
use crate::session::{DEFAULT_ACTIVITY_THRESHOLD, DEFAULT_EVOLUTION_THRESHOLD};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub evolution_threshold: f64,
    pub activity_threshold: f64,
    pub repeat_interval_ms: u64,
    pub tick_rate_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            evolution_threshold: DEFAULT_EVOLUTION_THRESHOLD,
            activity_threshold: DEFAULT_ACTIVITY_THRESHOLD,
            repeat_interval_ms: 1500,
            tick_rate_ms: 100,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.evolution_threshold.is_finite() || self.evolution_threshold <= 0.0 {
            return Err(ConfigError::EvolutionThreshold(self.evolution_threshold));
        }
        if !(0.0..=100.0).contains(&self.activity_threshold) {
            return Err(ConfigError::ActivityThreshold(self.activity_threshold));
        }
        if self.repeat_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "repeat_interval_ms",
            });
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "tick_rate_ms",
            });
        }
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::ServerUrl(self.server_url.clone()));
        }
        Ok(())
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("focusdash_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config")
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(path = %self.path.display(), %err, "cannot read config"),
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"evolution_threshold": 250.0}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.evolution_threshold, 250.0);
        assert_eq!(cfg.repeat_interval_ms, 1500);
    }

    #[test]
    fn garbage_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
        assert_eq!(Config::default().repeat_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn rejects_non_positive_evolution_threshold() {
        let cfg = Config {
            evolution_threshold: 0.0,
            ..Config::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EvolutionThreshold(0.0)));
    }

    #[test]
    fn rejects_bad_server_url_and_intervals() {
        let cfg = Config {
            server_url: "localhost:8000".into(),
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ServerUrl(_))));

        let cfg = Config {
            tick_rate_ms: 0,
            ..Config::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroInterval {
                name: "tick_rate_ms"
            })
        );
    }

    #[test]
    fn default_store_uses_the_standard_location() {
        assert_eq!(FileConfigStore::default().path(), FileConfigStore::new().path());
    }
}
