use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transcript::Strategy;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub youtube: YouTubeConfig,
    pub openai: OpenAiConfig,
    pub transcript: TranscriptConfig,
    pub wordpress: WordPressConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct YouTubeConfig {
    pub api_key: Option<String>,
    pub oauth_token: Option<String>,
    pub api_base: String,
    pub oembed_url: String,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            oauth_token: None,
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            oembed_url: "https://www.youtube.com/oembed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4-1106-preview".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranscriptConfig {
    pub strategies: Vec<Strategy>,
    pub backend_url: Option<String>,
    pub timedtext_url: String,
    pub languages: Vec<String>,
    /// Command (program plus leading args) run with the video id appended
    pub script: Vec<String>,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            strategies: vec![Strategy::Backend, Strategy::DataApi, Strategy::TimedText],
            backend_url: None,
            timedtext_url: "https://www.youtube.com/api/timedtext".to_string(),
            languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
            script: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WordPressConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub app_password: Option<String>,
}

impl Config {
    /// Load config from the given path, or ~/.config/vscribe/config.toml, then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
        let mut config = if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path).map_err(|e| Error::ConfigFile {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            Self::parse(&content).map_err(|reason| Error::ConfigFile {
                path: path.clone(),
                reason,
            })?
        } else {
            debug!("No config file found at {}", path.display());
            Config::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Override secrets and endpoints from the environment; empty values are ignored
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai.api_key = Some(v);
        }
        if let Some(v) = get("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(v);
        }
        if let Some(v) = get("WORDPRESS_URL") {
            self.wordpress.url = Some(v);
        }
        if let Some(v) = get("WORDPRESS_USERNAME") {
            self.wordpress.username = Some(v);
        }
        if let Some(v) = get("WORDPRESS_APP_PASSWORD") {
            self.wordpress.app_password = Some(v);
        }
    }
}

/// A configured value, treating blank strings as absent
pub fn configured(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("vscribe")
        .join("config.toml")
}
