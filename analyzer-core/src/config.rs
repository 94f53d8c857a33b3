use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Upstream forecast provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-request timeout for the upstream call.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Summary cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            max_capacity: 100,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8080".to_string() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [api]
/// api_key = "..."
///
/// [cache]
/// ttl_secs = 1800
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Default config file location in the platform config dir.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-analyzer", "weather-analyzer")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the environment on top of the file config.
    ///
    /// Blank variables are ignored. Unparseable numbers are an error rather than
    /// being silently dropped.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("WEATHER_API_KEY") {
            self.api.api_key = Some(key);
        }
        if let Some(url) = get("WEATHER_API_URL") {
            self.api.base_url = url;
        }
        if let Some(secs) = get("WEATHER_API_TIMEOUT_SECS") {
            self.api.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("WEATHER_API_TIMEOUT_SECS is not a number: {secs}"))?;
        }
        if let Some(secs) = get("WEATHER_CACHE_TTL_SECS") {
            self.cache.ttl_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("WEATHER_CACHE_TTL_SECS is not a number: {secs}"))?;
        }
        if let Some(bind) = get("WEATHER_BIND") {
            self.server.bind = bind;
        }

        Ok(())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api.api_key = Some(api_key);
    }

    /// Returns the API key, or an error telling the operator how to set one.
    pub fn api_key(&self) -> Result<&str> {
        self.api.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured for the forecast provider.\n\
                 Hint: run `weather-analyzer configure` or set WEATHER_API_KEY."
            )
        })
    }
}
