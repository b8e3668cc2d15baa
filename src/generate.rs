use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{OpenAiConfig, configured};
use crate::error::{Error, Result};

/// Roughly 3000 tokens at ~4 characters per token
pub const MAX_TRANSCRIPT_CHARS: usize = 12_000;

const TEMPERATURE: f32 = 0.4;
const MAX_TOKENS: u32 = 4096;
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);
const CHECK_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You are a professional editor who turns video transcripts into long, \
well-structured blog posts. Keep the structure clear, name every source the speaker cites, \
and never shorten the content unless you have to.";

const FALLBACK_TITLES: [&str; 3] = ["Generated Title 1", "Generated Title 2", "Generated Title 3"];

/// Summary and title ideas produced by the completion service
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeneratedContent {
    pub summary: String,
    #[serde(default)]
    pub titles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ApiError>,
}

/// Generate a blog post summary and alternative titles from a transcript
pub async fn generate(client: &reqwest::Client, config: &OpenAiConfig, transcript: &str, title: &str) -> Result<GeneratedContent> {
    let api_key = configured(&config.api_key).ok_or(Error::MissingConfig("OpenAI API key"))?;

    let transcript = truncate_transcript(transcript, MAX_TRANSCRIPT_CHARS);
    debug!(
        "Generating content via OpenAI with model {} ({} transcript chars)",
        config.model,
        transcript.chars().count()
    );

    let body = serde_json::json!({
        "model": config.model,
        "messages": [
            {
                "role": "system",
                "content": SYSTEM_PROMPT
            },
            {
                "role": "user",
                "content": user_prompt(&transcript, title)
            }
        ],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS
    });

    let resp = client
        .post(format!("{}/chat/completions", config.base_url.trim_end_matches('/')))
        .bearer_auth(api_key)
        .json(&body)
        .timeout(COMPLETION_TIMEOUT)
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;
    let reply = extract_reply(status, &text)?;
    Ok(parse_content(&reply))
}

fn user_prompt(transcript: &str, title: &str) -> String {
    format!(
        "The text below is an automatic transcript of the video \"{title}\". \
Write a detailed, well-formatted article of at least 1000 words that covers its content in \
connected prose, with an introduction, the main line of thought, and a conclusion. \
Do not add information that is not in the transcript.\n\n\
Respond with a JSON object of the form {{\"summary\": \"<article as HTML>\", \
\"titles\": [\"<title>\", \"<title>\", \"<title>\"]}} containing three alternative titles.\n\n\
Transcript: {transcript}"
    )
}

/// Cut the transcript to `max_chars` characters, marking the cut with "..."
pub fn truncate_transcript(transcript: &str, max_chars: usize) -> String {
    match transcript.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &transcript[..idx]),
        None => transcript.to_string(),
    }
}

fn extract_reply(status: reqwest::StatusCode, body: &str) -> Result<String> {
    let parsed: Option<ChatResponse> = serde_json::from_str(body).ok();

    if let Some(ChatResponse { error: Some(err), .. }) = &parsed {
        return Err(Error::Provider(err.message.clone()));
    }
    if !status.is_success() {
        return Err(Error::upstream("OpenAI", format!("{status}: {}", body.trim())));
    }

    parsed
        .and_then(|r| r.choices.into_iter().next())
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::upstream("OpenAI", "unexpected response format"))
}

/// Read the model's reply as JSON, falling back to the raw reply with placeholder titles
pub fn parse_content(reply: &str) -> GeneratedContent {
    let trimmed = strip_code_fence(reply.trim());
    match serde_json::from_str::<GeneratedContent>(trimmed) {
        Ok(content) => content,
        Err(e) => {
            debug!("Reply is not structured content ({e}), using it as the summary");
            GeneratedContent {
                summary: reply.to_string(),
                titles: FALLBACK_TITLES.iter().map(|t| t.to_string()).collect(),
            }
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Validate the stored API key by listing models
pub async fn check_provider(client: &reqwest::Client, config: &OpenAiConfig) -> Result<()> {
    let api_key = configured(&config.api_key).ok_or(Error::MissingConfig("OpenAI API key"))?;

    let resp = client
        .get(format!("{}/models", config.base_url.trim_end_matches('/')))
        .bearer_auth(api_key)
        .timeout(CHECK_TIMEOUT)
        .send()
        .await?;

    if resp.status().is_success() {
        return Ok(());
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .map(|e| e.message)
        .unwrap_or_else(|| "Unknown error".to_string());
    Err(Error::Provider(message))
}
