//! The document record threaded through every pipeline stage.

use serde::Serialize;

/// Mutable state for one video-to-blog run.
///
/// Fields are private so the write-once ones (`source_reference`,
/// `transcript`, `summary`) can only be set by the stage that owns them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentState {
    source_reference: String,
    transcript: Option<String>,
    summary: Option<String>,
    draft: Option<String>,
    approved: Option<bool>,
    feedback: Option<String>,
}

impl DocumentState {
    /// Start a new document for a video reference.
    pub fn new(source_reference: impl Into<String>) -> Self {
        Self {
            source_reference: source_reference.into(),
            transcript: None,
            summary: None,
            draft: None,
            approved: None,
            feedback: None,
        }
    }

    pub fn source_reference(&self) -> &str {
        &self.source_reference
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// The current draft. There is only ever one.
    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// `None` until review has run.
    pub fn approved(&self) -> Option<bool> {
        self.approved
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub(crate) fn set_transcript(&mut self, transcript: String) {
        self.transcript = Some(transcript);
    }

    pub(crate) fn set_summary(&mut self, summary: String) {
        self.summary = Some(summary);
    }

    pub(crate) fn set_draft(&mut self, draft: String) {
        self.draft = Some(draft);
    }

    /// Replace the draft with a revision and drop the feedback that produced it.
    pub(crate) fn apply_revision(&mut self, draft: String) {
        self.draft = Some(draft);
        self.feedback = None;
    }

    pub(crate) fn mark_approved(&mut self) {
        self.approved = Some(true);
        self.feedback = None;
    }

    pub(crate) fn record_rejection(&mut self, feedback: String) {
        self.approved = Some(false);
        self.feedback = Some(feedback);
    }

    pub(crate) fn clear_feedback(&mut self) {
        self.feedback = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_empty() {
        let doc = DocumentState::new("https://youtu.be/abc123");
        assert_eq!(doc.source_reference(), "https://youtu.be/abc123");
        assert!(doc.transcript().is_none());
        assert!(doc.summary().is_none());
        assert!(doc.draft().is_none());
        assert!(doc.approved().is_none());
        assert!(doc.feedback().is_none());
    }

    #[test]
    fn test_approval_clears_feedback() {
        let mut doc = DocumentState::new("abc");
        doc.set_draft("draft".to_string());
        doc.record_rejection("too short".to_string());
        assert_eq!(doc.approved(), Some(false));
        assert_eq!(doc.feedback(), Some("too short"));

        doc.mark_approved();
        assert_eq!(doc.approved(), Some(true));
        assert!(doc.feedback().is_none());
    }

    #[test]
    fn test_revision_overwrites_single_draft() {
        let mut doc = DocumentState::new("abc");
        doc.set_draft("first".to_string());
        doc.record_rejection("more".to_string());
        doc.apply_revision("second".to_string());

        assert_eq!(doc.draft(), Some("second"));
        assert!(doc.feedback().is_none());
    }
}
