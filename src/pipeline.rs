//! End-to-end processing of one video URL.
//!
//! Stages run strictly in order:
//! `idle → validating-url → fetching-metadata → extracting-transcript →
//! generating-content → creating-draft → done`. The first failing stage ends
//! the run in `failed`, carrying the error message. Nothing is retried or
//! rolled back; a featured-image failure after the draft exists is only logged.

use std::fmt;

use log::{info, warn};
use serde::Serialize;

use crate::config::Config;
use crate::draft::DraftPost;
use crate::error::Result;
use crate::transcript::{self, Strategy};
use crate::wordpress::WordPress;
use crate::{VideoReference, generate, youtube};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Idle,
    ValidatingUrl,
    FetchingMetadata,
    ExtractingTranscript,
    GeneratingContent,
    CreatingDraft,
    Done,
    Failed(String),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::ValidatingUrl => write!(f, "validating-url"),
            Stage::FetchingMetadata => write!(f, "fetching-metadata"),
            Stage::ExtractingTranscript => write!(f, "extracting-transcript"),
            Stage::GeneratingContent => write!(f, "generating-content"),
            Stage::CreatingDraft => write!(f, "creating-draft"),
            Stage::Done => write!(f, "done"),
            Stage::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub message: String,
    pub post_id: u64,
    pub edit_url: String,
    pub video_id: String,
    pub title: String,
    pub transcript_source: Strategy,
    pub thumbnail_attached: bool,
    /// False when WordPress dropped the video metadata fields
    pub meta_saved: bool,
}

/// Turn one YouTube URL into a WordPress draft, reporting each stage to `on_stage`
pub async fn process(
    client: &reqwest::Client,
    config: &Config,
    input: &str,
    mut on_stage: impl FnMut(&Stage),
) -> Result<ProcessOutcome> {
    let mut report = |stage: Stage| {
        info!("Stage: {stage}");
        on_stage(&stage);
    };

    report(Stage::Idle);
    let result = run(client, config, input, &mut report).await;
    match &result {
        Ok(_) => report(Stage::Done),
        Err(e) => report(Stage::Failed(e.to_string())),
    }
    result
}

async fn run<F: FnMut(Stage)>(client: &reqwest::Client, config: &Config, input: &str, report: &mut F) -> Result<ProcessOutcome> {
    report(Stage::ValidatingUrl);
    let video = VideoReference::parse(input)?;

    report(Stage::FetchingMetadata);
    let metadata = youtube::fetch_metadata(client, &config.youtube, &video).await?;

    report(Stage::ExtractingTranscript);
    let transcript = transcript::acquire(client, config, &video.id).await?;

    let wordpress = WordPress::from_config(client, &config.wordpress)?;

    report(Stage::GeneratingContent);
    let content = generate::generate(client, &config.openai, &transcript.text, &metadata.title).await?;

    report(Stage::CreatingDraft);
    let post = DraftPost::new(&metadata, &content);
    let created = wordpress.create_draft(&post).await?;
    let post_id = created.id;

    let thumbnail_attached = match metadata.thumbnail_url.as_deref() {
        Some(url) => match wordpress.attach_thumbnail(post_id, url, &metadata.title).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Could not set featured image for post {post_id}: {e}");
                false
            }
        },
        None => false,
    };

    Ok(ProcessOutcome {
        message: "Post draft created successfully!".to_string(),
        post_id,
        edit_url: wordpress.edit_url(post_id),
        video_id: video.id,
        title: metadata.title,
        transcript_source: transcript.source,
        thumbnail_attached,
        meta_saved: created.meta_saved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};

    use crate::Error;
    use crate::draft::META_SOURCE_URL;
    use crate::testutil::serve_with;

    #[derive(Clone, Default)]
    struct Fake {
        base: String,
        hits: Arc<AtomicUsize>,
        chat_calls: Arc<AtomicUsize>,
        posts: Arc<Mutex<Vec<serde_json::Value>>>,
        backend_fails: bool,
        thumbnail_missing: bool,
        meta_dropped: bool,
    }

    impl Fake {
        fn hit(&self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn oembed(State(fake): State<Fake>) -> Response {
        fake.hit();
        axum::Json(serde_json::json!({
            "title": "Never Gonna Give You Up",
            "author_name": "Rick Astley",
            "thumbnail_url": format!("{}/thumb.jpg", fake.base)
        }))
        .into_response()
    }

    async fn backend(State(fake): State<Fake>) -> Response {
        fake.hit();
        if fake.backend_fails {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({ "detail": "upstream blocked" })),
            )
                .into_response();
        }
        axum::Json(serde_json::json!({ "transcript": "[Music] We're no strangers to love\nyou know the rules" }))
            .into_response()
    }

    async fn timedtext(State(fake): State<Fake>) -> Response {
        fake.hit();
        StatusCode::NOT_FOUND.into_response()
    }

    async fn chat(State(fake): State<Fake>) -> Response {
        fake.hit();
        fake.chat_calls.fetch_add(1, Ordering::SeqCst);
        axum::Json(serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"summary\": \"<p>A song about commitment.</p>\", \"titles\": [\"Commitment\", \"Rules of Love\", \"Never Giving Up\"]}"
                }
            }]
        }))
        .into_response()
    }

    async fn create_post(State(fake): State<Fake>, axum::Json(body): axum::Json<serde_json::Value>) -> Response {
        fake.hit();
        let meta = if fake.meta_dropped {
            serde_json::json!([])
        } else {
            body["meta"].clone()
        };
        fake.posts.lock().unwrap().push(body);
        (StatusCode::CREATED, axum::Json(serde_json::json!({ "id": 101, "meta": meta }))).into_response()
    }

    async fn update_post(State(fake): State<Fake>, Path(id): Path<u64>) -> Response {
        fake.hit();
        axum::Json(serde_json::json!({ "id": id })).into_response()
    }

    async fn upload_media(State(fake): State<Fake>) -> Response {
        fake.hit();
        (StatusCode::CREATED, axum::Json(serde_json::json!({ "id": 7 }))).into_response()
    }

    async fn thumbnail(State(fake): State<Fake>) -> Response {
        fake.hit();
        if fake.thumbnail_missing {
            return StatusCode::NOT_FOUND.into_response();
        }
        ([("content-type", "image/jpeg")], vec![0xFFu8, 0xD8, 0xFF, 0xE0]).into_response()
    }

    /// Start a fake YouTube/backend/OpenAI/WordPress server and a config pointing at it
    async fn setup(fake: Fake) -> (Fake, Config) {
        let mut shared = fake;
        let state = shared.clone();
        let base = serve_with(move |base| {
            let state = Fake {
                base: base.to_string(),
                ..state
            };
            Router::new()
                .route("/oembed", get(oembed))
                .route("/transcript", get(backend))
                .route("/api/timedtext", get(timedtext))
                .route("/v1/chat/completions", post(chat))
                .route("/wp-json/wp/v2/posts", post(create_post))
                .route("/wp-json/wp/v2/posts/{id}", post(update_post))
                .route("/wp-json/wp/v2/media", post(upload_media))
                .route("/thumb.jpg", get(thumbnail))
                .with_state(state)
        })
        .await;
        shared.base = base.clone();

        let mut config = Config::default();
        config.youtube.oembed_url = format!("{base}/oembed");
        config.transcript.backend_url = Some(base.clone());
        config.transcript.timedtext_url = format!("{base}/api/timedtext");
        config.openai.api_key = Some("sk-test".to_string());
        config.openai.base_url = format!("{base}/v1");
        config.wordpress.url = Some(base.clone());
        config.wordpress.username = Some("admin".to_string());
        config.wordpress.app_password = Some("secret".to_string());
        (shared, config)
    }

    async fn run_collecting(config: &Config, url: &str) -> (Result<ProcessOutcome>, Vec<Stage>) {
        let client = reqwest::Client::new();
        let mut stages = Vec::new();
        let result = process(&client, config, url, |s| stages.push(s.clone())).await;
        (result, stages)
    }

    #[tokio::test]
    async fn test_url_to_draft() {
        let (fake, config) = setup(Fake::default()).await;
        let (result, stages) = run_collecting(&config, "https://www.youtube.com/watch?v=dQw4w9WgXcQ").await;

        let outcome = result.unwrap();
        assert_eq!(outcome.post_id, 101);
        assert_eq!(outcome.video_id, "dQw4w9WgXcQ");
        assert_eq!(outcome.transcript_source, Strategy::Backend);
        assert!(outcome.thumbnail_attached);
        assert!(outcome.meta_saved);
        assert_eq!(
            outcome.edit_url,
            format!("{}/wp-admin/post.php?post=101&action=edit", fake.base)
        );
        assert_eq!(
            stages,
            vec![
                Stage::Idle,
                Stage::ValidatingUrl,
                Stage::FetchingMetadata,
                Stage::ExtractingTranscript,
                Stage::GeneratingContent,
                Stage::CreatingDraft,
                Stage::Done,
            ]
        );

        let posts = fake.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post["status"], "draft");
        assert_eq!(post["title"], "Never Gonna Give You Up");
        assert!(post["meta"][META_SOURCE_URL].as_str().unwrap().contains("dQw4w9WgXcQ"));
        let content = post["content"].as_str().unwrap();
        assert!(content.starts_with("<p>A song about commitment.</p>"));
        assert!(content.contains("<li>Rules of Love</li>"));
        assert!(content.contains("<p>Channel: Rick Astley</p>"));
    }

    #[tokio::test]
    async fn test_all_transcript_strategies_fail() {
        let (fake, config) = setup(Fake {
            backend_fails: true,
            ..Fake::default()
        })
        .await;
        let (result, stages) = run_collecting(&config, "https://youtu.be/dQw4w9WgXcQ").await;

        match result {
            Err(Error::TranscriptUnavailable(failures)) => {
                let strategies: Vec<_> = failures.iter().map(|f| f.strategy).collect();
                assert_eq!(strategies, vec![Strategy::Backend, Strategy::DataApi, Strategy::TimedText]);
            }
            other => panic!("expected aggregated transcript failure, got {other:?}"),
        }
        assert!(matches!(stages.last(), Some(Stage::Failed(msg)) if msg.starts_with("failed to extract video transcript")));
        assert!(!stages.contains(&Stage::GeneratingContent));
        assert_eq!(fake.chat_calls.load(Ordering::SeqCst), 0);
        assert!(fake.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_openai_key() {
        let (fake, mut config) = setup(Fake::default()).await;
        config.openai.api_key = Some(String::new());
        let (result, stages) = run_collecting(&config, "https://www.youtube.com/watch?v=dQw4w9WgXcQ").await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
        assert_eq!(
            stages.last(),
            Some(&Stage::Failed("OpenAI API key is not configured".to_string()))
        );
        assert_eq!(fake.chat_calls.load(Ordering::SeqCst), 0);
        assert!(fake.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_requests() {
        let (fake, config) = setup(Fake::default()).await;
        let (result, stages) = run_collecting(&config, "https://vimeo.com/76979871").await;

        assert!(matches!(result, Err(Error::InvalidUrl(_))));
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[1], Stage::ValidatingUrl);
        assert_eq!(fake.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_thumbnail_failure_is_tolerated() {
        let (fake, config) = setup(Fake {
            thumbnail_missing: true,
            ..Fake::default()
        })
        .await;
        let (result, stages) = run_collecting(&config, "dQw4w9WgXcQ").await;

        let outcome = result.unwrap();
        assert!(!outcome.thumbnail_attached);
        assert_eq!(stages.last(), Some(&Stage::Done));
        assert_eq!(fake.posts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_meta_is_reported() {
        let (fake, config) = setup(Fake {
            meta_dropped: true,
            ..Fake::default()
        })
        .await;
        let (result, stages) = run_collecting(&config, "dQw4w9WgXcQ").await;

        let outcome = result.unwrap();
        assert!(!outcome.meta_saved);
        assert_eq!(outcome.post_id, 101);
        assert_eq!(stages.last(), Some(&Stage::Done));
        assert_eq!(fake.posts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_wordpress_config_skips_generation() {
        let (fake, mut config) = setup(Fake::default()).await;
        config.wordpress.app_password = None;
        let (result, stages) = run_collecting(&config, "dQw4w9WgXcQ").await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
        assert_eq!(
            stages.last(),
            Some(&Stage::Failed("WordPress application password is not configured".to_string()))
        );
        assert!(!stages.contains(&Stage::GeneratingContent));
        assert_eq!(fake.chat_calls.load(Ordering::SeqCst), 0);
        assert!(fake.posts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::ExtractingTranscript.to_string(), "extracting-transcript");
        assert_eq!(Stage::Failed("boom".into()).to_string(), "failed: boom");
    }
}
