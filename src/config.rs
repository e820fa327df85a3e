//! Configuration management for Komikku.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name used for config directory.
const APP_NAME: &str = "Komikku";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Content-delivery hosts and path prefixes that serve chapter pages.
const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "cdn-jp-gmbr.gmbr.pro/storage/drive",
    "aim.gmbr.pro/storage/drive",
    "cdn-go-wd.gmbr.pro/storage/drive",
    "in.gmbr.pro/storage/drive",
    "svr-65.gmbr.pro/storage/drive",
    "img-uwak.gmbr.pro/storage/drive",
    "cdn-okto.gmbr.pro/storage/drive",
    "v1-kj.gmbr.pro/storage/drive",
    "jp.belajarserver.xyz/storage/drive",
    "img-id.gmbr.pro/uploads/manga-images",
    "kj.gmbr.pro/storage/drive",
    "img.gmbar.xyz/storage/drive",
    "cdn-kj.gmbr.pro/storage/drive",
    "gmbr.manhwaland.in/uploads/manga-images",
    "i3.wp.com/cdn-go-wd.gmbr.pro/storage",
    "gmbr.pro",
    "belajarserver.xyz",
    "gmbar.xyz",
    "wp.com",
    "cdn.uqni.net/images",
    "uqni.net",
    "go.gmbar.xyz/storage/drive",
    "in.gmbr.pro/uploads/manga-images/d",
    "in.gmbr.pro",
    "go.uwakjawa.xyz/storage/drive",
    "wibulep.xyz/uploads/manga-images/d",
    "kambingjantan.cc/storage/drive",
    "kambingjantan.cc",
    "wibulep.xyz",
];

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Web scraping settings.
    pub scraping: ScrapingConfig,

    /// Chapter image allow-list.
    pub images: ImageConfig,

    /// Error alert delivery.
    pub alerts: AlertConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Returns the `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Web scraping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Root URL of the source site, with trailing slash.
    pub base_url: String,

    /// User agent sent with every upstream request.
    pub user_agent: String,

    /// Optional request timeout in seconds. Unset means the client default.
    pub request_timeout_sec: Option<u64>,

    /// Enable scraper debug logging.
    pub debug: bool,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.manhwaland.blog/".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            request_timeout_sec: None,
            debug: false,
        }
    }
}

/// Chapter image allow-list configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Substrings that mark a URL as a chapter page image.
    pub allowed_hosts: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: DEFAULT_ALLOWED_HOSTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Telegram alert configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Bot token issued by BotFather. Empty disables alerts.
    pub telegram_bot_token: String,

    /// Chat that receives alerts.
    pub telegram_chat_id: String,

    /// Bot API root, overridable for testing.
    pub api_base: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

impl AlertConfig {
    /// Checks if both the token and the chat are set.
    pub fn is_configured(&self) -> bool {
        !self.telegram_bot_token.is_empty() && !self.telegram_chat_id.is_empty()
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.scraping.base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                key: "scraping.base_url".to_string(),
                message: format!("'{}' is not an absolute URL", self.scraping.base_url),
            });
        }

        if self.images.allowed_hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "images.allowed_hosts".to_string(),
                message: "must contain at least one entry".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "server.port".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
