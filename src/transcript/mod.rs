//! Transcript acquisition.
//!
//! A transcript is produced by the first [`Strategy`] in the configured chain
//! that returns non-empty text once cleaned. Every strategy takes the video id
//! and yields the raw transcript or an error; failures are collected and
//! reported together when the chain is exhausted.

mod backend;
pub mod cleanup;
mod data_api;
mod script;
pub mod timedtext;

use std::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result, StrategyFailure};

pub use cleanup::clean_transcript;

/// A way of obtaining a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Private transcript service answering `GET /transcript?video_id=`
    Backend,
    /// YouTube Data API caption listing and download
    DataApi,
    /// Public timed-text XML endpoint
    TimedText,
    /// External command printing `{"transcript": ...}` as JSON
    Script,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Backend => write!(f, "backend"),
            Strategy::DataApi => write!(f, "data-api"),
            Strategy::TimedText => write!(f, "timed-text"),
            Strategy::Script => write!(f, "script"),
        }
    }
}

/// Cleaned transcript text and where it came from
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: String,
    pub text: String,
    pub source: Strategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Asr,
    Manual,
}

/// A caption stream for one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub id: String,
    pub language: String,
    pub kind: TrackKind,
    pub name: String,
}

/// Pick the best caption track: auto-generated in a preferred language, then
/// any track in a preferred language, then whatever comes first.
pub fn select_track<'a, S: AsRef<str>>(tracks: &'a [CaptionTrack], languages: &[S]) -> Option<&'a CaptionTrack> {
    let preferred = |t: &CaptionTrack| languages.iter().any(|l| l.as_ref() == t.language);

    tracks
        .iter()
        .find(|t| preferred(t) && t.kind == TrackKind::Asr)
        .or_else(|| tracks.iter().find(|t| preferred(t)))
        .or_else(|| tracks.first())
}

/// Run the configured strategies in order and return the first usable transcript
pub async fn acquire(client: &reqwest::Client, config: &Config, video_id: &str) -> Result<Transcript> {
    let mut failures = Vec::new();

    for &strategy in &config.transcript.strategies {
        debug!("Trying transcript strategy {strategy} for {video_id}");

        let outcome = match run(strategy, client, config, video_id).await {
            Ok(raw) => {
                let text = clean_transcript(&raw);
                if text.is_empty() {
                    Err(Error::upstream("transcript", "empty transcript"))
                } else {
                    Ok(text)
                }
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(text) => {
                info!("Transcript for {video_id} from {strategy} ({} chars)", text.len());
                return Ok(Transcript {
                    video_id: video_id.to_string(),
                    text,
                    source: strategy,
                });
            }
            Err(e) => {
                debug!("Strategy {strategy} failed: {e}");
                failures.push(StrategyFailure {
                    strategy,
                    reason: e.to_string(),
                });
            }
        }
    }

    Err(Error::TranscriptUnavailable(failures))
}

async fn run(strategy: Strategy, client: &reqwest::Client, config: &Config, video_id: &str) -> Result<String> {
    match strategy {
        Strategy::Backend => backend::fetch(client, &config.transcript, video_id).await,
        Strategy::DataApi => data_api::fetch(client, &config.youtube, &config.transcript.languages, video_id).await,
        Strategy::TimedText => timedtext::fetch(client, &config.transcript, video_id).await,
        Strategy::Script => script::fetch(&config.transcript.script, video_id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANGS: [&str; 3] = ["en", "en-US", "en-GB"];

    fn track(id: &str, language: &str, kind: TrackKind) -> CaptionTrack {
        CaptionTrack {
            id: id.to_string(),
            language: language.to_string(),
            kind,
            name: String::new(),
        }
    }

    #[test]
    fn test_select_prefers_auto_generated_english() {
        let tracks = vec![
            track("en-manual", "en", TrackKind::Manual),
            track("en-asr", "en", TrackKind::Asr),
            track("fr-manual", "fr", TrackKind::Manual),
        ];
        assert_eq!(select_track(&tracks, &LANGS[..]).unwrap().id, "en-asr");
    }

    #[test]
    fn test_select_falls_back_to_manual_english() {
        let tracks = vec![
            track("fr-asr", "fr", TrackKind::Asr),
            track("gb-manual", "en-GB", TrackKind::Manual),
        ];
        assert_eq!(select_track(&tracks, &LANGS[..]).unwrap().id, "gb-manual");
    }

    #[test]
    fn test_select_falls_back_to_first_track() {
        let tracks = vec![track("fr-manual", "fr", TrackKind::Manual)];
        assert_eq!(select_track(&tracks, &LANGS[..]).unwrap().id, "fr-manual");
    }

    #[test]
    fn test_select_empty() {
        assert!(select_track(&[], &LANGS[..]).is_none());
    }

    #[test]
    fn test_select_is_deterministic() {
        let tracks = vec![
            track("a", "de", TrackKind::Asr),
            track("b", "en-US", TrackKind::Asr),
            track("c", "en", TrackKind::Asr),
        ];
        for _ in 0..3 {
            assert_eq!(select_track(&tracks, &LANGS[..]).unwrap().id, "b");
        }
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::DataApi.to_string(), "data-api");
        assert_eq!(Strategy::TimedText.to_string(), "timed-text");
    }

    #[tokio::test]
    async fn test_acquire_with_no_strategies() {
        let mut config = Config::default();
        config.transcript.strategies.clear();
        let client = reqwest::Client::new();
        let err = acquire(&client, &config, "dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, Error::TranscriptUnavailable(ref f) if f.is_empty()));
    }

    #[tokio::test]
    async fn test_acquire_reports_every_failure() {
        // Backend without a URL and data-api without a key fail before any request
        let mut config = Config::default();
        config.transcript.strategies = vec![Strategy::Backend, Strategy::DataApi];
        let client = reqwest::Client::new();
        match acquire(&client, &config, "dQw4w9WgXcQ").await {
            Err(Error::TranscriptUnavailable(failures)) => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].strategy, Strategy::Backend);
                assert_eq!(failures[1].strategy, Strategy::DataApi);
            }
            other => panic!("expected aggregated failure, got {other:?}"),
        }
    }
}
