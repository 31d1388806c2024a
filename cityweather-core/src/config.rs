use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const BIND_ADDR_ENV: &str = "CITYWEATHER_BIND_ADDR";
pub const DATA_FILE_ENV: &str = "CITYWEATHER_DATA_FILE";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Credentials and endpoint of the OpenWeather API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenWeatherConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl OpenWeatherConfig {
    /// The configured key, with a blank value treated as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr() }
    }
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON document holding the users. Users live in memory only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [server]
/// bind_addr = "0.0.0.0:3000"
///
/// [openweather]
/// api_key = "..."
///
/// [store]
/// data_file = "/var/lib/cityweather/users.json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub openweather: OpenWeatherConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load config from `path` (or the platform default), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = Self::load_file(path)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load_file(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Overlay values found through `lookup` (normally the process environment).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.openweather.api_key = Some(key);
        }
        if let Some(addr) = lookup(BIND_ADDR_ENV).filter(|a| !a.trim().is_empty()) {
            self.server.bind_addr = addr;
        }
        if let Some(file) = lookup(DATA_FILE_ENV).filter(|f| !f.trim().is_empty()) {
            self.store.data_file = Some(PathBuf::from(file));
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = Self::resolve_path(path)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(p.to_path_buf()),
            None => Self::config_file_path(),
        }
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.openweather.api_key = Some(api_key);
    }

    /// Returns the OpenWeather API key, if present.
    pub fn api_key(&self) -> Option<&str> {
        self.openweather.api_key()
    }

    pub fn is_api_key_configured(&self) -> bool {
        self.api_key().is_some()
    }
}
