use log::debug;
use serde::Deserialize;

use super::{CaptionTrack, TrackKind, select_track};
use crate::config::{YouTubeConfig, configured};
use crate::youtube::API_KEY_HEADER;
use crate::error::{Error, Result};

const SERVICE: &str = "YouTube captions";

#[derive(Debug, Deserialize)]
struct CaptionListResponse {
    #[serde(default)]
    items: Vec<CaptionItem>,
}

#[derive(Debug, Deserialize)]
struct CaptionItem {
    id: String,
    snippet: CaptionSnippet,
}

#[derive(Debug, Deserialize)]
struct CaptionSnippet {
    language: String,
    #[serde(rename = "trackKind", default)]
    track_kind: String,
    #[serde(default)]
    name: String,
}

impl From<CaptionItem> for CaptionTrack {
    fn from(item: CaptionItem) -> Self {
        let kind = if item.snippet.track_kind.eq_ignore_ascii_case("asr") {
            TrackKind::Asr
        } else {
            TrackKind::Manual
        };
        CaptionTrack {
            id: item.id,
            language: item.snippet.language,
            kind,
            name: item.snippet.name,
        }
    }
}

/// List caption tracks through the Data API and download the best one as SRT.
///
/// Downloading caption content requires an OAuth token; with only an API key
/// the track is found but the strategy fails.
pub async fn fetch(client: &reqwest::Client, config: &YouTubeConfig, languages: &[String], video_id: &str) -> Result<String> {
    let api_key = configured(&config.api_key).ok_or(Error::MissingConfig("YouTube API key"))?;
    let base = config.api_base.trim_end_matches('/');

    debug!("Listing Data API captions for {video_id}");
    let list: CaptionListResponse = client
        .get(format!("{base}/captions"))
        .query(&[("part", "snippet"), ("videoId", video_id)])
        .header(API_KEY_HEADER, api_key)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let tracks: Vec<CaptionTrack> = list.items.into_iter().map(CaptionTrack::from).collect();
    let track = select_track(&tracks, languages).ok_or_else(|| Error::upstream(SERVICE, "no caption tracks"))?;
    debug!("Selected caption track {} ({}, {:?})", track.id, track.language, track.kind);

    let token = configured(&config.oauth_token).ok_or(Error::MissingConfig("YouTube OAuth token for caption download"))?;

    let srt = client
        .get(format!("{base}/captions/{}", track.id))
        .query(&[("tfmt", "srt")])
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let text = srt_text(&srt);
    if text.is_empty() {
        return Err(Error::upstream(SERVICE, "empty caption download"));
    }
    Ok(text)
}

/// Keep only the cue text of an SRT document, one space between lines.
///
/// A numeric line directly before a timing line is the cue index and is dropped.
pub fn srt_text(srt: &str) -> String {
    let mut pieces = Vec::new();
    let mut lines = srt.trim_start_matches('\u{feff}').lines().map(str::trim).peekable();

    while let Some(line) = lines.next() {
        if line.is_empty() || line.contains("-->") {
            continue;
        }
        let is_index = line.chars().all(|c| c.is_ascii_digit());
        if is_index && lines.peek().is_some_and(|next| next.contains("-->")) {
            continue;
        }
        pieces.push(line);
    }

    pieces.join(" ")
}
