//! Pipeline stages: extract, summarize, draft and revise.
//!
//! Every stage takes the document by mutable reference and writes to it only
//! after its work succeeded, so a failing stage leaves the document untouched.

use crate::config::Prompts;
use crate::document::DocumentState;
use crate::error::{BlogError, Result};
use crate::generator::TextGenerator;
use crate::transcript_source::{join_segments, parse_video_id, TranscriptSource};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// A pipeline step, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Summarize,
    Draft,
    Revise,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Extract => write!(f, "Extract"),
            Stage::Summarize => write!(f, "Summarize"),
            Stage::Draft => write!(f, "Draft"),
            Stage::Revise => write!(f, "Revise"),
        }
    }
}

/// Runs the stages against injected collaborators.
pub struct Pipeline {
    source: Arc<dyn TranscriptSource>,
    generator: Arc<dyn TextGenerator>,
    prompts: Prompts,
    timeout: Duration,
}

impl Pipeline {
    /// Create a pipeline with the default generation timeout.
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        generator: Arc<dyn TextGenerator>,
        prompts: Prompts,
    ) -> Self {
        Self {
            source,
            generator,
            prompts,
            timeout: Duration::from_secs(crate::openai::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Bound every generator call by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the generator (for display of the model name).
    pub fn generator(&self) -> Arc<dyn TextGenerator> {
        self.generator.clone()
    }

    /// Run extract, summarize and draft for a new reference.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn prepare(&self, reference: &str) -> Result<DocumentState> {
        let mut document = DocumentState::new(reference);
        self.extract(&mut document).await?;
        self.summarize(&mut document).await?;
        self.draft(&mut document).await?;
        Ok(document)
    }

    /// Fetch the transcript for the document's source reference.
    #[instrument(skip(self, document), fields(reference = %document.source_reference()))]
    pub async fn extract(&self, document: &mut DocumentState) -> Result<()> {
        let video_id = parse_video_id(document.source_reference()).map_err(BlogError::extraction)?;

        info!("Fetching transcript for {}", video_id);
        let segments = self
            .source
            .fetch(&video_id)
            .await
            .map_err(BlogError::extraction)?;

        let transcript = join_segments(&segments);
        if transcript.trim().is_empty() {
            return Err(BlogError::extraction(BlogError::TranscriptUnavailable(
                format!("Transcript for {} is empty", video_id),
            )));
        }

        debug!("Transcript has {} segments", segments.len());
        document.set_transcript(transcript);
        Ok(())
    }

    /// Summarize the transcript.
    #[instrument(skip(self, document))]
    pub async fn summarize(&self, document: &mut DocumentState) -> Result<()> {
        let transcript = require(document.transcript(), Stage::Summarize, "a transcript")?;

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.blog.summarize, &vars);

        let summary = self.generate(Stage::Summarize, &prompt).await?;
        document.set_summary(summary);
        Ok(())
    }

    /// Expand the summary into a structured blog post.
    #[instrument(skip(self, document))]
    pub async fn draft(&self, document: &mut DocumentState) -> Result<()> {
        let summary = require(document.summary(), Stage::Draft, "a summary")?;

        let mut vars = HashMap::new();
        vars.insert("summary".to_string(), summary.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.blog.draft, &vars);

        let draft = self.generate(Stage::Draft, &prompt).await?;
        document.set_draft(draft);
        Ok(())
    }

    /// Rewrite the current draft using the pending feedback.
    ///
    /// An absent feedback is sent as an empty string. On success the draft is
    /// replaced and the feedback cleared; on failure both are kept.
    #[instrument(skip(self, document))]
    pub async fn revise(&self, document: &mut DocumentState) -> Result<()> {
        let draft = require(document.draft(), Stage::Revise, "a draft")?;

        let mut vars = HashMap::new();
        vars.insert("draft".to_string(), draft.to_string());
        vars.insert(
            "feedback".to_string(),
            document.feedback().unwrap_or_default().to_string(),
        );
        let prompt = self.prompts.render_with_custom(&self.prompts.blog.revise, &vars);

        let revised = self.generate(Stage::Revise, &prompt).await?;
        document.apply_revision(revised);
        Ok(())
    }

    /// Call the generator with a bounded wait and reject empty output.
    async fn generate(&self, stage: Stage, prompt: &str) -> Result<String> {
        debug!("{} prompt is {} characters", stage, prompt.len());

        let text = match tokio::time::timeout(self.timeout, self.generator.generate(prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(BlogError::generation(stage, e)),
            Err(_) => {
                return Err(BlogError::generation(
                    stage,
                    BlogError::Timeout(self.timeout.as_secs()),
                ))
            }
        };

        if text.trim().is_empty() {
            return Err(BlogError::generation(stage, BlogError::EmptyResponse));
        }

        Ok(text)
    }
}

/// Require a non-empty predecessor output.
fn require<'a>(value: Option<&'a str>, stage: Stage, missing: &'static str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BlogError::Validation { stage, missing }),
    }
}
