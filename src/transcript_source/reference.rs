//! Video reference parsing.

use crate::error::{BlogError, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

fn video_id_regex() -> &'static Regex {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    VIDEO_ID.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid regex"))
}

fn valid_id(candidate: &str) -> Option<String> {
    video_id_regex()
        .is_match(candidate)
        .then(|| candidate.to_string())
}

/// Extract the video id from a YouTube URL or a bare id.
///
/// Accepts `watch?v=`, `youtu.be/`, and `/embed/`, `/shorts/`, `/live/`, `/v/` paths.
pub fn parse_video_id(reference: &str) -> Result<String> {
    let reference = reference.trim();
    let invalid = || BlogError::InvalidReference(reference.to_string());

    if reference.is_empty() {
        return Err(invalid());
    }

    if let Some(id) = valid_id(reference) {
        return Ok(id);
    }

    // Allow scheme-less URLs like "youtu.be/abc".
    let url = Url::parse(reference)
        .or_else(|_| Url::parse(&format!("https://{}", reference)))
        .map_err(|_| invalid())?;

    let host = url.host_str().ok_or_else(invalid)?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

    let candidate = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                Some("embed" | "shorts" | "live" | "v") => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    };

    candidate.as_deref().and_then(valid_id).ok_or_else(invalid)
}
