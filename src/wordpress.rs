use std::sync::LazyLock;

use chrono::NaiveDateTime;
use log::{debug, info, warn};
use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::{WordPressConfig, configured};
use crate::draft::{DraftPost, META_SOURCE_URL};
use crate::error::{Error, Result};

const SERVICE: &str = "WordPress";
const TOTAL_PAGES: &str = "x-wp-totalpages";

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("filename pattern"));

/// A post created by this tool, as listed by `recent`
#[derive(Debug, Clone, Serialize)]
pub struct RecentPost {
    pub id: u64,
    pub title: String,
    pub date: String,
    pub status: String,
    pub thumbnail: Option<String>,
    pub edit_url: String,
    pub view_url: String,
}

/// A newly created draft and whether WordPress stored its video metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedDraft {
    pub id: u64,
    pub meta_saved: bool,
}

#[derive(Debug, Deserialize)]
struct CreatedResource {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: u64,
    #[serde(default)]
    meta: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WpErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WpPost {
    id: u64,
    #[serde(default)]
    date: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    link: String,
    title: WpRendered,
    /// An object of registered keys, or `[]` when none are exposed
    #[serde(default)]
    meta: serde_json::Value,
    #[serde(rename = "_embedded", default)]
    embedded: Option<WpEmbedded>,
}

#[derive(Debug, Deserialize)]
struct WpRendered {
    #[serde(default)]
    rendered: String,
}

#[derive(Debug, Deserialize)]
struct WpEmbedded {
    #[serde(rename = "wp:featuredmedia", default)]
    featured_media: Vec<WpMedia>,
}

#[derive(Debug, Deserialize)]
struct WpMedia {
    source_url: Option<String>,
    media_details: Option<WpMediaDetails>,
}

#[derive(Debug, Deserialize)]
struct WpMediaDetails {
    #[serde(default)]
    sizes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WpUser {
    name: String,
}

impl WpPost {
    fn source_url(&self) -> Option<&str> {
        self.meta.get(META_SOURCE_URL).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
    }

    fn thumbnail(&self) -> Option<String> {
        let media = self.embedded.as_ref()?.featured_media.first()?;
        media
            .media_details
            .as_ref()
            .and_then(|d| d.sizes.get("thumbnail"))
            .and_then(|t| t.get("source_url"))
            .and_then(|u| u.as_str())
            .map(str::to_string)
            .or_else(|| media.source_url.clone())
    }
}

/// WordPress REST API client authenticated with an application password
pub struct WordPress<'a> {
    client: &'a reqwest::Client,
    base_url: String,
    username: String,
    app_password: String,
}

impl<'a> WordPress<'a> {
    pub fn from_config(client: &'a reqwest::Client, config: &WordPressConfig) -> Result<Self> {
        let base_url = configured(&config.url).ok_or(Error::MissingConfig("WordPress URL"))?;
        let username = configured(&config.username).ok_or(Error::MissingConfig("WordPress username"))?;
        let app_password =
            configured(&config.app_password).ok_or(Error::MissingConfig("WordPress application password"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            app_password: app_password.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{path}", self.base_url)
    }

    pub fn edit_url(&self, post_id: u64) -> String {
        format!("{}/wp-admin/post.php?post={post_id}&action=edit", self.base_url)
    }

    /// Create the post as a draft.
    ///
    /// WordPress silently drops meta keys that are not registered with
    /// `show_in_rest`; that is reported through `CreatedDraft::meta_saved`.
    pub async fn create_draft(&self, post: &DraftPost) -> Result<CreatedDraft> {
        debug!("Creating WordPress draft: {}", post.title);
        let resp = self
            .client
            .post(self.endpoint("posts"))
            .basic_auth(&self.username, Some(&self.app_password))
            .json(post)
            .send()
            .await?;

        let created: CreatedPost = read_json(resp).await?;
        let meta_saved = created.meta.get(META_SOURCE_URL).and_then(|v| v.as_str()) == Some(post.meta.source_url.as_str());
        if !meta_saved {
            warn!(
                "Draft {} was created without {META_SOURCE_URL}; register the post meta with show_in_rest",
                created.id
            );
        }
        info!("Created draft post {}", created.id);
        Ok(CreatedDraft {
            id: created.id,
            meta_saved,
        })
    }

    /// Download an image, upload it to the media library and make it the post's featured image
    pub async fn attach_thumbnail(&self, post_id: u64, image_url: &str, title: &str) -> Result<u64> {
        debug!("Downloading thumbnail {image_url}");
        let image = self.client.get(image_url).send().await?.error_for_status()?;
        let content_type = image
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = image.bytes().await?;
        if bytes.is_empty() {
            return Err(Error::upstream("thumbnail download", "empty image"));
        }

        let filename = sanitize_file_name(title);
        let resp = self
            .client
            .post(self.endpoint("media"))
            .basic_auth(&self.username, Some(&self.app_password))
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\""))
            .body(bytes)
            .send()
            .await?;
        let media: CreatedResource = read_json(resp).await?;

        let resp = self
            .client
            .post(self.endpoint(&format!("posts/{post_id}")))
            .basic_auth(&self.username, Some(&self.app_password))
            .json(&serde_json::json!({ "featured_media": media.id }))
            .send()
            .await?;
        let _: CreatedResource = read_json(resp).await?;

        debug!("Attached media {} to post {post_id}", media.id);
        Ok(media.id)
    }

    /// Most recent drafts and published posts created from videos, newest first.
    ///
    /// Pages through the post list until `limit` generated posts are found or
    /// the site runs out of pages.
    pub async fn recent_posts(&self, limit: usize) -> Result<Vec<RecentPost>> {
        let per_page = limit.saturating_mul(4).clamp(20, 100);
        let per_page_param = per_page.to_string();
        let mut found = Vec::new();
        let mut page = 1usize;

        while found.len() < limit {
            let page_param = page.to_string();
            let resp = self
                .client
                .get(self.endpoint("posts"))
                .basic_auth(&self.username, Some(&self.app_password))
                .query(&[
                    ("status", "draft,publish"),
                    ("per_page", per_page_param.as_str()),
                    ("page", page_param.as_str()),
                    ("orderby", "date"),
                    ("order", "desc"),
                    ("context", "edit"),
                    ("_embed", "wp:featuredmedia"),
                ])
                .send()
                .await?;

            let total_pages = resp
                .headers()
                .get(TOTAL_PAGES)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<usize>().ok());
            let posts: Vec<WpPost> = read_json(resp).await?;
            let fetched = posts.len();
            debug!("Recent posts page {page}: {fetched} posts");

            let remaining = limit - found.len();
            found.extend(
                posts
                    .into_iter()
                    .filter(|p| p.source_url().is_some())
                    .take(remaining)
                    .map(|p| self.recent_post(p)),
            );

            let last_page = match total_pages {
                Some(total) => page >= total,
                None => fetched < per_page,
            };
            if last_page || fetched == 0 {
                break;
            }
            page += 1;
        }

        Ok(found)
    }

    fn recent_post(&self, post: WpPost) -> RecentPost {
        RecentPost {
            id: post.id,
            thumbnail: post.thumbnail(),
            edit_url: self.edit_url(post.id),
            date: format_post_date(&post.date),
            title: html_escape::decode_html_entities(&post.title.rendered).to_string(),
            status: post.status,
            view_url: post.link,
        }
    }

    /// Verify the credentials, returning the authenticated user's display name
    pub async fn check(&self) -> Result<String> {
        let resp = self
            .client
            .get(self.endpoint("users/me"))
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?;
        let user: WpUser = read_json(resp).await?;
        Ok(user.name)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<WpErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| body.trim().to_string());
        return Err(Error::upstream(SERVICE, format!("{status}: {message}")));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Format a WordPress local date (`2026-10-17T09:30:00`) as `Oct 17, 2026`
pub fn format_post_date(date: &str) -> String {
    NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S")
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

/// Lowercase, dash-separated `<title>.jpg`
pub fn sanitize_file_name(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stem = UNSAFE_FILENAME_CHARS.replace_all(&lowered, "-");
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "thumbnail.jpg".to_string()
    } else {
        format!("{stem}.jpg")
    }
}
