//! Transcript sources for ytblog.
//!
//! A transcript source resolves a video identifier to ordered, timed text segments.

mod reference;
mod youtube;

pub use reference::parse_video_id;
pub use youtube::YoutubeTranscriptSource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single caption segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start_seconds: f64,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(text: impl Into<String>, start_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
        }
    }
}

/// Join segment texts in order, one segment per line.
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the ordered transcript for a video id.
    ///
    /// Fails with `TranscriptNotFound` when the video does not exist and
    /// `TranscriptUnavailable` when it has no usable captions.
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_segments_keeps_order() {
        let segments = vec![
            TranscriptSegment::new("Hello", 0.0),
            TranscriptSegment::new("world", 1.2),
            TranscriptSegment::new("today", 2.5),
        ];
        assert_eq!(join_segments(&segments), "Hello\nworld\ntoday");
    }

    #[test]
    fn test_join_segments_empty() {
        assert_eq!(join_segments(&[]), "");
    }
}
