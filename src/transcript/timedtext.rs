use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{CaptionTrack, TrackKind, select_track};
use crate::config::TranscriptConfig;
use crate::error::{Error, Result};

const SERVICE: &str = "timed-text";

/// Fetch captions from YouTube's public timed-text endpoint
pub async fn fetch(client: &reqwest::Client, config: &TranscriptConfig, video_id: &str) -> Result<String> {
    let base = config.timedtext_url.as_str();
    debug!("Listing timed-text tracks: {base}?type=list&v={video_id}");

    let list_xml = client
        .get(base)
        .query(&[("type", "list"), ("v", video_id)])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    if list_xml.trim().is_empty() {
        return Err(Error::upstream(SERVICE, "empty track list"));
    }

    let tracks = parse_track_list(&list_xml)?;
    let track = select_track(&tracks, config.languages.as_slice()).ok_or_else(|| Error::upstream(SERVICE, "no caption tracks"))?;
    debug!("Using timed-text track: lang={} kind={:?}", track.language, track.kind);

    let mut params = vec![("lang", track.language.as_str()), ("v", video_id)];
    if track.kind == TrackKind::Asr {
        params.push(("kind", "asr"));
    }
    if !track.name.is_empty() {
        params.push(("name", track.name.as_str()));
    }

    let caption_xml = client
        .get(base)
        .query(&params)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    if caption_xml.trim().is_empty() {
        return Err(Error::upstream(SERVICE, "empty caption body"));
    }

    let text = parse_caption_text(&caption_xml)?;
    if text.is_empty() {
        return Err(Error::upstream(SERVICE, "caption track has no text"));
    }
    Ok(text)
}

/// Parse a `type=list` response into caption tracks, in document order
pub fn parse_track_list(xml: &str) -> Result<Vec<CaptionTrack>> {
    let mut reader = Reader::from_str(xml);
    let mut tracks = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == b"track" => {
                tracks.push(track_from_element(e, tracks.len()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(tracks)
}

fn track_from_element(e: &BytesStart<'_>, index: usize) -> CaptionTrack {
    let mut track = CaptionTrack {
        id: index.to_string(),
        language: String::new(),
        kind: TrackKind::Manual,
        name: String::new(),
    };

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        let value = html_escape::decode_html_entities(&value).to_string();
        match attr.key.as_ref() {
            b"id" => track.id = value,
            b"lang_code" => track.language = value,
            b"name" => track.name = value,
            b"kind" if value == "asr" => track.kind = TrackKind::Asr,
            _ => {}
        }
    }

    track
}

/// Concatenate the content of every `<text>` node, separated by single spaces
pub fn parse_caption_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut pieces = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) if e.name().as_ref() == b"text" => {
                current = Some(String::new());
            }
            Event::End(ref e) if e.name().as_ref() == b"text" => {
                if let Some(piece) = current.take() {
                    let piece = piece.trim();
                    if !piece.is_empty() {
                        pieces.push(piece.to_string());
                    }
                }
            }
            Event::Text(ref e) => {
                if let Some(buf) = current.as_mut() {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    buf.push_str(&html_escape::decode_html_entities(&raw_text));
                }
            }
            Event::CData(e) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pieces.join(" "))
}
