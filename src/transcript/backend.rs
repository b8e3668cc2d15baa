use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::config::{TranscriptConfig, configured};
use crate::error::{Error, Result};

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct BackendResponse {
    transcript: Option<String>,
    detail: Option<String>,
}

/// Ask the transcript backend service for the video's transcript
pub async fn fetch(client: &reqwest::Client, config: &TranscriptConfig, video_id: &str) -> Result<String> {
    let base = configured(&config.backend_url).ok_or(Error::MissingConfig("transcript backend URL"))?;
    let url = format!("{}/transcript", base.trim_end_matches('/'));
    debug!("Fetching transcript from backend: {url}?video_id={video_id}");

    let resp = client
        .get(&url)
        .query(&[("video_id", video_id)])
        .timeout(TIMEOUT)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;
    if body.trim().is_empty() {
        return Err(Error::upstream("transcript backend", format!("empty response ({status})")));
    }

    if !status.is_success() {
        let detail = serde_json::from_str::<BackendResponse>(&body)
            .ok()
            .and_then(|r| r.detail)
            .unwrap_or_else(|| status.to_string());
        return Err(Error::upstream("transcript backend", detail));
    }

    let parsed: BackendResponse = serde_json::from_str(&body)?;
    parsed
        .transcript
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::upstream("transcript backend", "response has no transcript"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use axum::Router;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;

    use crate::testutil::serve;

    fn config(base: &str) -> TranscriptConfig {
        TranscriptConfig {
            backend_url: Some(format!("{base}/")),
            ..TranscriptConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_transcript() {
        let app = Router::new().route(
            "/transcript",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                axum::Json(serde_json::json!({ "transcript": format!("words for {}", q["video_id"]) }))
            }),
        );
        let base = serve(app).await;
        let text = fetch(&reqwest::Client::new(), &config(&base), "dQw4w9WgXcQ").await.unwrap();
        assert_eq!(text, "words for dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let app = Router::new().route(
            "/transcript",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    axum::Json(serde_json::json!({ "detail": "No transcript available" })),
                )
            }),
        );
        let base = serve(app).await;
        let err = fetch(&reqwest::Client::new(), &config(&base), "dQw4w9WgXcQ").await.unwrap_err();
        assert_eq!(err.to_string(), "transcript backend request failed: No transcript available");
    }

    #[tokio::test]
    async fn test_fetch_gateway_error_page() {
        let app = Router::new().route(
            "/transcript",
            get(|| async { (StatusCode::BAD_GATEWAY, "<html><body>502 Bad Gateway</body></html>") }),
        );
        let base = serve(app).await;
        let err = fetch(&reqwest::Client::new(), &config(&base), "dQw4w9WgXcQ").await.unwrap_err();
        assert_eq!(err.to_string(), "transcript backend request failed: 502 Bad Gateway");
    }

    #[tokio::test]
    async fn test_fetch_without_url() {
        let err = fetch(&reqwest::Client::new(), &TranscriptConfig::default(), "dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingConfig(_)));
    }
}
