use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Token issued by the platform; doubles as the webhook path secret.
    pub bot_token: String,
    /// Root of the Bot API. The token is appended per request.
    pub api_base: String,
    /// Thumbnail shown next to inline search results.
    pub thumb_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/countmein.db?mode=rwc".to_string(),
            max_connections: 16,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: "https://api.telegram.org/bot".to_string(),
            thumb_url: "https://countmeinbot.appspot.com/thumb.jpg".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`; a missing file yields the defaults so a first run
    /// can start from a bare checkout.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path:?}"))?;
        toml::from_str(&contents).with_context(|| format!("parsing config file {path:?}"))
    }

    /// Full URL prefix requests are posted to, e.g.
    /// `https://api.telegram.org/bot<token>`.
    pub fn api_root(&self) -> String {
        format!("{}{}", self.telegram.api_base, self.telegram.bot_token)
    }
}
