pub mod config;
pub mod draft;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod transcript;
pub mod wordpress;
pub mod youtube;

#[cfg(test)]
mod testutil;

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

pub use error::{Error, ErrorKind, Result};

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("bare id pattern"));

static URL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|embed/|v/|e/|shorts/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .expect("video url pattern")
});

/// A validated YouTube video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoReference {
    pub id: String,
    pub url: String,
}

impl VideoReference {
    pub fn parse(input: &str) -> Result<Self> {
        let url = input.trim();
        if url.is_empty() {
            return Err(Error::InvalidUrl("no URL provided".to_string()));
        }
        let id = extract_video_id(url).ok_or_else(|| Error::InvalidUrl(url.to_string()))?;
        Ok(Self {
            id,
            url: url.to_string(),
        })
    }

    pub fn watch_url(&self) -> String {
        watch_url(&self.id)
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Video details from the metadata provider
#[derive(Debug, Clone, Serialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel: String,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
}

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }

    URL_ID.captures(input).map(|caps| caps[1].to_string())
}
