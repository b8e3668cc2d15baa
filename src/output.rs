use serde::Serialize;

use crate::error::{Error, Result};
use crate::pipeline::ProcessOutcome;
use crate::wordpress::RecentPost;

#[derive(Serialize)]
struct Success<'a, T: Serialize> {
    success: bool,
    data: &'a T,
}

#[derive(Serialize)]
struct Failure<'a> {
    success: bool,
    kind: crate::ErrorKind,
    message: &'a str,
}

/// Render a created draft as plain text
pub fn render_outcome_text(outcome: &ProcessOutcome) -> String {
    let mut lines = vec![
        outcome.message.clone(),
        format!("Title: {}", outcome.title),
        format!("Draft ID: {}", outcome.post_id),
        format!("Edit: {}", outcome.edit_url),
    ];
    if !outcome.thumbnail_attached {
        lines.push("Featured image: not set".to_string());
    }
    if !outcome.meta_saved {
        lines.push("Video metadata: not saved (register the videoscribe_* post meta with show_in_rest)".to_string());
    }
    lines.join("\n")
}

/// Render recently generated posts, one block per post
pub fn render_recent_text(posts: &[RecentPost]) -> String {
    if posts.is_empty() {
        return "No generated posts yet.".to_string();
    }
    posts
        .iter()
        .map(|p| {
            format!(
                "#{} {} [{}] {}\n    edit: {}\n    view: {}",
                p.id, p.title, p.status, p.date, p.edit_url, p.view_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap a successful result as `{"success": true, "data": ...}`
pub fn render_success_json<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Success { success: true, data })?)
}

/// Render a failure as `{"success": false, "kind": ..., "message": ...}`
pub fn render_failure_json(err: &Error) -> Result<String> {
    let message = err.to_string();
    Ok(serde_json::to_string_pretty(&Failure {
        success: false,
        kind: err.kind(),
        message: &message,
    })?)
}
