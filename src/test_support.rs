//! Scripted collaborators for unit tests.

use crate::error::{BlogError, Result};
use crate::generator::TextGenerator;
use crate::transcript_source::{TranscriptSegment, TranscriptSource};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays queued replies and records every prompt it receives.
pub(crate) struct ScriptedGenerator {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    always_fail: Option<String>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub(crate) fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            always_fail: None,
            delay: None,
        }
    }

    pub(crate) fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for reply in replies {
            generator.push_reply(reply);
        }
        generator
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            always_fail: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub(crate) fn push_failure(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.always_fail {
            return Err(BlogError::Generator(message.clone()));
        }

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(BlogError::Generator(message)),
            None => Err(BlogError::Generator("no scripted reply left".to_string())),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Returns a fixed transcript, or a not-found error.
pub(crate) struct StaticSource {
    segments: Option<Vec<TranscriptSegment>>,
    calls: Arc<AtomicUsize>,
}

impl StaticSource {
    pub(crate) fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| TranscriptSegment::new(text, i as f64 * 2.0))
            .collect();
        Self {
            segments: Some(segments),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            segments: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl TranscriptSource for StaticSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.segments
            .clone()
            .ok_or_else(|| BlogError::TranscriptNotFound(video_id.to_string()))
    }
}
