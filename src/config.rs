use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub feed: FeedConfig,

    pub verified: VerifiedConfig,

    pub playback: PlaybackConfig,

    pub anilist: AnilistConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Notification bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            event_bus_buffer_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,

    /// Quality token every query requires unless quality is ignored.
    /// `None` falls back to "1080".
    pub preferred_quality: Option<String>,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,

    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nyaa.si".to_string(),
            preferred_quality: Some("1080".to_string()),
            request_timeout_seconds: 30,
            user_agent: "ReleaseResolver/1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifiedConfig {
    pub enabled: bool,

    pub source_url: String,
}

impl Default for VerifiedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source_url: crate::constants::VERIFIED_SOURCE_URL.to_string(),
        }
    }
}

/// What the local player can decode. Unsupported codecs are excluded from queries.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlaybackConfig {
    pub hevc_supported: bool,

    pub ac3_supported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnilistConfig {
    pub api_url: String,
}

impl Default for AnilistConfig {
    fn default() -> Self {
        Self {
            api_url: "https://graphql.anilist.co".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("release-resolver").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".release-resolver").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.feed.base_url)
            .with_context(|| format!("Invalid feed base URL: {}", self.feed.base_url))?;

        if self.feed.request_timeout_seconds == 0 {
            anyhow::bail!("Feed request timeout must be > 0");
        }

        if self.verified.enabled && self.verified.source_url.is_empty() {
            anyhow::bail!("Verified source URL cannot be empty when enabled");
        }

        Ok(())
    }

    /// Quality token for queries, or `None` when the user cleared it.
    #[must_use]
    pub fn quality_token(&self) -> Option<&str> {
        match self.feed.preferred_quality.as_deref() {
            Some(q) if q.trim().is_empty() => None,
            Some(q) => Some(q.trim()),
            None => Some(crate::constants::DEFAULT_QUALITY),
        }
    }
}
