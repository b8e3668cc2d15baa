use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;

use crate::VideoMetadata;
use crate::generate::GeneratedContent;

pub const META_SOURCE_URL: &str = "videoscribe_source_url";
pub const META_VIDEO_ID: &str = "videoscribe_video_id";
pub const META_CHANNEL: &str = "videoscribe_channel";

/// A post ready to be created as a WordPress draft
#[derive(Debug, Clone, Serialize)]
pub struct DraftPost {
    pub title: String,
    pub content: String,
    pub status: &'static str,
    pub meta: PostMeta,
}

/// Source details stored with the post
#[derive(Debug, Clone, Serialize)]
pub struct PostMeta {
    #[serde(rename = "videoscribe_source_url")]
    pub source_url: String,
    #[serde(rename = "videoscribe_video_id")]
    pub video_id: String,
    #[serde(rename = "videoscribe_channel")]
    pub channel: String,
}

impl DraftPost {
    pub fn new(video: &VideoMetadata, content: &GeneratedContent) -> Self {
        Self {
            title: video.title.clone(),
            content: render_post_body(video, content),
            status: "draft",
            meta: PostMeta {
                source_url: crate::watch_url(&video.video_id),
                video_id: video.video_id.clone(),
                channel: video.channel.clone(),
            },
        }
    }
}

/// Assemble the post HTML: summary, source link, channel and title suggestions
pub fn render_post_body(video: &VideoMetadata, content: &GeneratedContent) -> String {
    let source_url = crate::watch_url(&video.video_id);

    let mut html = String::new();
    html.push_str(&content.summary);
    html.push_str("\n\n");
    html.push_str("<h3>Original Video</h3>\n");
    html.push_str(&format!(
        "<p>Source: <a href=\"{}\" target=\"_blank\">{}</a></p>\n",
        encode_double_quoted_attribute(&source_url),
        encode_text(&video.title)
    ));
    html.push_str(&format!("<p>Channel: {}</p>\n\n", encode_text(&video.channel)));

    if !content.titles.is_empty() {
        html.push_str("<h3>Alternative Title Suggestions</h3>\n<ul>\n");
        for title in &content.titles {
            html.push_str(&format!("<li>{}</li>\n", encode_text(title)));
        }
        html.push_str("</ul>\n");
    }

    html
}
