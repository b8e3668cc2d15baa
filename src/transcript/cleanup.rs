use std::sync::LazyLock;

use regex::Regex;

static TIMESTAMP_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}:\d{2}:\d{2}[.,]\d{3}\s*-->\s*\d{2}:\d{2}:\d{2}[.,]\d{3}").expect("timestamp pattern")
});

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

static ARTIFACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[(?:music|applause|laughter)\]").expect("artifact pattern"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Strip timestamps, tags and caption artifacts, and collapse whitespace.
///
/// Repeats until stable, so `clean_transcript(clean_transcript(x)) == clean_transcript(x)`.
pub fn clean_transcript(raw: &str) -> String {
    let mut text = clean_once(raw);
    loop {
        let next = clean_once(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn clean_once(text: &str) -> String {
    let text = TIMESTAMP_RANGE.replace_all(text, " ");
    let text = HTML_TAG.replace_all(&text, "");
    let text = ARTIFACT.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}
