use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Base URLs of every provider plus the connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub coingecko: String,
    pub binance: String,
    pub open_meteo: String,
    /// City name is appended as a path segment.
    pub wttr: String,
    /// Source currency is appended as a path segment.
    pub exchangerate_api: String,
    pub frankfurter: String,
    pub probe: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            coingecko: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            binance: "https://api.binance.com/api/v3/ticker/price".to_string(),
            open_meteo: "https://api.open-meteo.com/v1/forecast".to_string(),
            wttr: "https://wttr.in".to_string(),
            exchangerate_api: "https://api.exchangerate-api.com/v4/latest".to_string(),
            frankfurter: "https://api.frankfurter.app/latest".to_string(),
            probe: "https://httpbin.org/status/200".to_string(),
        }
    }
}

impl Endpoints {
    /// Every endpoint under one base URL, e.g. a local mock server:
    /// `<base>/coingecko`, `<base>/wttr`, `<base>/status/200`, ...
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            coingecko: format!("{base}/coingecko"),
            binance: format!("{base}/binance"),
            open_meteo: format!("{base}/open-meteo"),
            wttr: format!("{base}/wttr"),
            exchangerate_api: format!("{base}/exchangerate-api"),
            frankfurter: format!("{base}/frankfurter"),
            probe: format!("{base}/status/200"),
        }
    }
}

/// Top-level client configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// timeout_secs = 10
/// max_retries = 3
///
/// [endpoints]
/// wttr = "https://wttr.in"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-request deadline.
    pub timeout_secs: u64,

    /// Extra attempts beyond the first, for queries that retry.
    pub max_retries: u32,

    /// First backoff delay; doubles on each retry of the same source.
    pub backoff_base_ms: u64,

    pub probe_timeout_secs: u64,

    /// Apply the backoff policy to weather and exchange-rate lookups too.
    /// By default only price lookups retry a source.
    pub uniform_retries: bool,

    /// Keep successful results in memory for this long. `None` disables caching.
    pub cache_ttl_secs: Option<u64>,

    pub endpoints: Endpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            backoff_base_ms: 500,
            probe_timeout_secs: 5,
            uniform_retries: false,
            cache_ttl_secs: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse client configuration")
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: ClientConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

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

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "apiclient", "apiclient")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ClientConfig::default();

        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.backoff_base(), Duration::from_millis(500));
        assert_eq!(cfg.probe_timeout(), Duration::from_secs(5));
        assert!(!cfg.uniform_retries);
        assert_eq!(cfg.cache_ttl(), None);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg = ClientConfig::from_toml_str(
            r#"
            max_retries = 1
            cache_ttl_secs = 300

            [endpoints]
            wttr = "http://localhost:9000"
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.max_retries, 1);
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(cfg.cache_ttl(), Some(Duration::from_secs(300)));
        assert_eq!(cfg.endpoints.wttr, "http://localhost:9000");
        assert_eq!(cfg.endpoints.binance, Endpoints::default().binance);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = ClientConfig::from_toml_str("timeout_secs = \"soon\"").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Failed to parse client configuration"));
    }

    #[test]
    fn toml_roundtrip_preserves_config() {
        let cfg = ClientConfig {
            uniform_retries: true,
            cache_ttl_secs: Some(60),
            ..ClientConfig::default()
        };

        let text = toml::to_string_pretty(&cfg).expect("config should serialize");
        let parsed = ClientConfig::from_toml_str(&text).expect("config should parse");
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn rooted_endpoints_share_base() {
        let endpoints = Endpoints::rooted_at("http://127.0.0.1:1234/");

        assert_eq!(endpoints.coingecko, "http://127.0.0.1:1234/coingecko");
        assert_eq!(endpoints.probe, "http://127.0.0.1:1234/status/200");
    }
}
