use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::{DefaultFetcher, FileFetcher, HttpFetcher};

const APP_DIR: &str = "hitscreen";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path or URL of the screen registry document
    pub registry: String,
    /// Directory relative resource paths resolve against
    pub assets_dir: PathBuf,
    /// When set, relative resource paths are fetched from this URL instead
    pub base_url: Option<String>,
    pub fetch_timeout_secs: u64,
    pub log_file: PathBuf,
    /// Frame interval of the terminal host
    pub tick_ms: u64,
    /// Enables the calibrator overlay
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: "screens.json".to_string(),
            assets_dir: PathBuf::from("."),
            base_url: None,
            fetch_timeout_secs: 10,
            log_file: PathBuf::from("hitscreen.log"),
            tick_ms: 16,
            debug: false,
        }
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR);
        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", path);

        if !path.exists() {
            info!("Config file {:?} doesn't exist, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        debug!("Loaded config with registry {}", config.registry);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty() && !d.exists()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
            info!("Created config directory: {:?}", dir);
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(path, content).with_context(|| format!("Failed to write config file: {:?}", path))?;

        info!("Config saved to {:?}", path);
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    /// Fetcher for hit-region documents: HTTP(S) URLs go to the network,
    /// everything else is read below `assets_dir` (or `base_url` when set)
    pub fn build_fetcher(&self) -> Result<DefaultFetcher> {
        let mut http = HttpFetcher::new(self.fetch_timeout())?;
        if let Some(base_url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            http = http.with_base_url(base_url)?;
        }
        Ok(DefaultFetcher::new(http, FileFetcher::new(self.assets_dir.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("hitscreen-config-{}", rand::random::<u64>()))
            .join(name)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(&temp_path("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tick(), Duration::from_millis(16));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = temp_path("config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "registry = \"assets/registry.json\"\ndebug = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.registry, "assets/registry.json");
        assert!(config.debug);
        assert_eq!(config.fetch_timeout_secs, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_path("nested/config.toml");
        let config = Config {
            base_url: Some("https://example.com/game/".to_string()),
            tick_ms: 33,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let path = temp_path("config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "tick_ms = \"fast\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
