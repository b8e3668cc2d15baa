use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;

use crate::config::{YouTubeConfig, configured};
use crate::error::{Error, Result};
use crate::{VideoMetadata, VideoReference};

/// Header carrying the Data API key, keeping it out of request URLs
pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn best(self) -> Option<String> {
        self.maxres.or(self.high).or(self.medium).or(self.default).map(|t| t.url)
    }
}

#[derive(Debug, Deserialize)]
struct OEmbed {
    title: String,
    #[serde(default)]
    author_name: String,
    thumbnail_url: Option<String>,
}

/// Fetch title, channel and thumbnail for a video.
///
/// Uses the Data API when a key is configured, the public oEmbed endpoint otherwise.
pub async fn fetch_metadata(client: &reqwest::Client, config: &YouTubeConfig, video: &VideoReference) -> Result<VideoMetadata> {
    match configured(&config.api_key) {
        Some(key) => fetch_data_api(client, config, key, &video.id).await,
        None => fetch_oembed(client, config, video).await,
    }
}

async fn fetch_data_api(client: &reqwest::Client, config: &YouTubeConfig, api_key: &str, video_id: &str) -> Result<VideoMetadata> {
    let url = format!("{}/videos", config.api_base.trim_end_matches('/'));
    debug!("Fetching video details from Data API: {url}?id={video_id}");

    let resp = client
        .get(&url)
        .query(&[("part", "snippet"), ("id", video_id)])
        .header(API_KEY_HEADER, api_key)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::upstream("YouTube Data API", format!("{status}: {}", api_error_message(&body))));
    }

    let list: VideoListResponse = resp.json().await?;
    let item = list
        .items
        .into_iter()
        .next()
        .ok_or_else(|| Error::upstream("YouTube Data API", "video not found"))?;

    let snippet = item.snippet;
    Ok(VideoMetadata {
        video_id: video_id.to_string(),
        title: snippet.title,
        description: snippet.description,
        channel: snippet.channel_title,
        published_at: snippet.published_at,
        thumbnail_url: snippet.thumbnails.best(),
    })
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

async fn fetch_oembed(client: &reqwest::Client, config: &YouTubeConfig, video: &VideoReference) -> Result<VideoMetadata> {
    let watch_url = video.watch_url();
    debug!("Fetching video details from oEmbed: {watch_url}");

    let resp = client
        .get(&config.oembed_url)
        .query(&[("url", watch_url.as_str()), ("format", "json")])
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(Error::upstream("YouTube oEmbed", format!("video not found ({})", resp.status())));
    }

    let oembed: OEmbed = resp.json().await?;
    Ok(VideoMetadata {
        video_id: video.id.clone(),
        title: oembed.title,
        description: String::new(),
        channel: oembed.author_name,
        published_at: None,
        thumbnail_url: oembed.thumbnail_url,
    })
}
