//! Review controller: the approve / reject / revise state machine.
//!
//! Transitions are a single table, [`transition`], mapping the current state
//! and an event to the action to perform and the next state. Anything not in
//! the table is rejected without touching the document.

use crate::document::DocumentState;
use crate::error::{BlogError, Result};
use crate::pipeline::{Pipeline, Stage};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Review status of a drafted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// A draft is ready for the reviewer.
    AwaitingReview,
    /// Feedback is recorded and a revision is pending.
    Revising,
    /// The draft is final.
    Approved,
    /// The reviewer rejected a draft after the last allowed revision.
    RevisionLimitReached,
}

impl ReviewState {
    /// Whether no further events are accepted (other than a repeated approval).
    pub fn is_terminal(self) -> bool {
        matches!(self, ReviewState::Approved | ReviewState::RevisionLimitReached)
    }
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewState::AwaitingReview => write!(f, "awaiting review"),
            ReviewState::Revising => write!(f, "revising"),
            ReviewState::Approved => write!(f, "approved"),
            ReviewState::RevisionLimitReached => write!(f, "revision limit reached"),
        }
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewEvent {
    Approve,
    Reject { feedback: String },
    Revised,
    RevisionFailed,
}

impl ReviewEvent {
    fn name(&self) -> &'static str {
        match self {
            ReviewEvent::Approve => "approve",
            ReviewEvent::Reject { .. } => "reject",
            ReviewEvent::Revised => "revised",
            ReviewEvent::RevisionFailed => "revision failed",
        }
    }
}

/// Side effect attached to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    None,
    MarkApproved,
    RecordFeedback,
    CompleteRevision,
    Exhaust,
}

/// The reviewer's verdict on the current draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub approved: bool,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl ReviewDecision {
    pub fn approve() -> Self {
        Self {
            approved: true,
            feedback: None,
        }
    }

    pub fn reject(feedback: impl Into<String>) -> Self {
        Self {
            approved: false,
            feedback: Some(feedback.into()),
        }
    }
}

/// Look up `(state, event)` in the transition table.
///
/// `revisions` is the number of completed revisions and `max_revisions` the cap.
pub fn transition(
    state: ReviewState,
    event: &ReviewEvent,
    revisions: u32,
    max_revisions: u32,
) -> Option<(ReviewAction, ReviewState)> {
    use ReviewAction as A;
    use ReviewEvent as E;
    use ReviewState as S;

    match (state, event) {
        (S::AwaitingReview, E::Approve) => Some((A::MarkApproved, S::Approved)),
        (S::Approved, E::Approve) => Some((A::None, S::Approved)),
        (S::AwaitingReview, E::Reject { .. }) if revisions < max_revisions => {
            Some((A::RecordFeedback, S::Revising))
        }
        (S::AwaitingReview, E::Reject { .. }) => Some((A::Exhaust, S::RevisionLimitReached)),
        (S::Revising, E::Revised) => Some((A::CompleteRevision, S::AwaitingReview)),
        (S::Revising, E::RevisionFailed) => Some((A::None, S::Revising)),
        _ => None,
    }
}

/// Drives one drafted document through review.
#[derive(Debug, Clone)]
pub struct ReviewController {
    document: DocumentState,
    state: ReviewState,
    revisions: u32,
    max_revisions: u32,
}

impl ReviewController {
    /// Enter review with a drafted document.
    pub fn new(document: DocumentState, max_revisions: u32) -> Result<Self> {
        if !matches!(document.draft(), Some(d) if !d.trim().is_empty()) {
            return Err(BlogError::Validation {
                stage: Stage::Draft,
                missing: "a draft to review",
            });
        }

        Ok(Self {
            document,
            state: ReviewState::AwaitingReview,
            revisions: 0,
            max_revisions,
        })
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn document(&self) -> &DocumentState {
        &self.document
    }

    pub fn into_document(self) -> DocumentState {
        self.document
    }

    /// Number of completed revisions.
    pub fn revisions(&self) -> u32 {
        self.revisions
    }

    pub fn max_revisions(&self) -> u32 {
        self.max_revisions
    }

    /// Apply an event from the table. Does not call the generator.
    fn apply(&mut self, event: ReviewEvent) -> Result<ReviewState> {
        let (action, next) = transition(self.state, &event, self.revisions, self.max_revisions)
            .ok_or_else(|| BlogError::InvalidTransition {
                state: self.state,
                event: event.name().to_string(),
            })?;

        match (action, event) {
            (ReviewAction::MarkApproved, _) => self.document.mark_approved(),
            (ReviewAction::RecordFeedback, ReviewEvent::Reject { feedback }) => {
                self.document.record_rejection(feedback)
            }
            (ReviewAction::Exhaust, ReviewEvent::Reject { feedback }) => {
                self.document.record_rejection(feedback);
                self.document.clear_feedback();
            }
            (ReviewAction::CompleteRevision, _) => self.revisions += 1,
            _ => {}
        }

        if next != self.state {
            info!("Review: {} -> {}", self.state, next);
        }
        self.state = next;
        Ok(next)
    }

    /// Approve the current draft. Repeating this once approved is a no-op.
    pub fn approve(&mut self) -> Result<ReviewState> {
        self.apply(ReviewEvent::Approve)
    }

    /// Reject the current draft. Empty feedback is allowed.
    pub fn reject(&mut self, feedback: impl Into<String>) -> Result<ReviewState> {
        self.apply(ReviewEvent::Reject {
            feedback: feedback.into(),
        })
    }

    /// Apply a reviewer decision collected by the presentation layer.
    pub fn submit(&mut self, decision: ReviewDecision) -> Result<ReviewState> {
        if decision.approved {
            self.approve()
        } else {
            self.reject(decision.feedback.unwrap_or_default())
        }
    }

    /// Run the revise stage for the pending feedback.
    ///
    /// Only valid while `Revising`. On failure the controller stays in
    /// `Revising` with the previous draft and feedback intact; calling this
    /// again retries.
    #[instrument(skip(self, pipeline))]
    pub async fn revise(&mut self, pipeline: &Pipeline) -> Result<ReviewState> {
        if self.state != ReviewState::Revising {
            return Err(BlogError::InvalidTransition {
                state: self.state,
                event: "revise".to_string(),
            });
        }

        match pipeline.revise(&mut self.document).await {
            Ok(()) => self.apply(ReviewEvent::Revised),
            Err(e) => {
                warn!("Revision failed: {}", e);
                self.apply(ReviewEvent::RevisionFailed)?;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::test_support::{ScriptedGenerator, StaticSource};
    use std::sync::Arc;

    fn drafted(draft: &str) -> DocumentState {
        let mut doc = DocumentState::new("https://youtu.be/abc123");
        doc.set_transcript("Hello".to_string());
        doc.set_summary("Topic: testing.".to_string());
        doc.set_draft(draft.to_string());
        doc
    }

    fn pipeline_with(generator: Arc<ScriptedGenerator>) -> Pipeline {
        Pipeline::new(Arc::new(StaticSource::lines(["Hello"])), generator, Prompts::default())
    }

    #[test]
    fn test_transition_table() {
        use ReviewAction as A;
        use ReviewState as S;
        let reject = ReviewEvent::Reject {
            feedback: "x".to_string(),
        };

        assert_eq!(
            transition(S::AwaitingReview, &ReviewEvent::Approve, 0, 5),
            Some((A::MarkApproved, S::Approved))
        );
        assert_eq!(
            transition(S::AwaitingReview, &reject, 4, 5),
            Some((A::RecordFeedback, S::Revising))
        );
        assert_eq!(
            transition(S::AwaitingReview, &reject, 5, 5),
            Some((A::Exhaust, S::RevisionLimitReached))
        );
        assert_eq!(
            transition(S::Revising, &ReviewEvent::Revised, 0, 5),
            Some((A::CompleteRevision, S::AwaitingReview))
        );
        assert_eq!(
            transition(S::Revising, &ReviewEvent::RevisionFailed, 0, 5),
            Some((A::None, S::Revising))
        );
        assert_eq!(transition(S::Approved, &reject, 0, 5), None);
        assert_eq!(transition(S::Revising, &ReviewEvent::Approve, 0, 5), None);
        assert_eq!(transition(S::RevisionLimitReached, &ReviewEvent::Approve, 0, 5), None);
    }

    #[test]
    fn test_requires_draft() {
        let doc = DocumentState::new("abc123");
        assert!(matches!(
            ReviewController::new(doc, 5),
            Err(BlogError::Validation { .. })
        ));
    }

    #[test]
    fn test_approval_is_idempotent() {
        let mut controller = ReviewController::new(drafted("Post"), 5).unwrap();
        assert_eq!(controller.approve().unwrap(), ReviewState::Approved);
        assert_eq!(controller.approve().unwrap(), ReviewState::Approved);
        assert_eq!(controller.document().approved(), Some(true));
        assert_eq!(controller.document().draft(), Some("Post"));
    }

    #[tokio::test]
    async fn test_approved_never_revises() {
        let generator = Arc::new(ScriptedGenerator::replying(["should not be used"]));
        let pipeline = pipeline_with(generator.clone());
        let mut controller = ReviewController::new(drafted("Post"), 5).unwrap();

        controller.approve().unwrap();
        assert!(matches!(
            controller.reject("late feedback"),
            Err(BlogError::InvalidTransition { state: ReviewState::Approved, .. })
        ));
        assert!(matches!(
            controller.revise(&pipeline).await,
            Err(BlogError::InvalidTransition { .. })
        ));

        assert_eq!(generator.calls(), 0);
        assert_eq!(controller.state(), ReviewState::Approved);
        assert!(controller.document().feedback().is_none());
    }

    #[tokio::test]
    async fn test_reject_then_revise_cycle() {
        let generator = Arc::new(ScriptedGenerator::replying(["Longer post"]));
        let pipeline = pipeline_with(generator.clone());
        let mut controller = ReviewController::new(drafted("Short post"), 5).unwrap();

        assert_eq!(controller.reject("too short").unwrap(), ReviewState::Revising);
        assert_eq!(controller.document().feedback(), Some("too short"));
        assert_eq!(controller.document().approved(), Some(false));

        assert_eq!(controller.revise(&pipeline).await.unwrap(), ReviewState::AwaitingReview);

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Short post"));
        assert!(prompts[0].contains("too short"));
        assert_eq!(controller.document().draft(), Some("Longer post"));
        assert!(controller.document().feedback().is_none());
        assert_eq!(controller.revisions(), 1);
    }

    #[tokio::test]
    async fn test_failed_revision_stays_revising() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_failure("connection reset");
        generator.push_reply("Fixed post");
        let pipeline = pipeline_with(generator.clone());
        let mut controller = ReviewController::new(drafted("Post"), 5).unwrap();
        controller.reject("add examples").unwrap();

        let err = controller.revise(&pipeline).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Revise));
        assert_eq!(controller.state(), ReviewState::Revising);
        assert_eq!(controller.document().draft(), Some("Post"));
        assert_eq!(controller.document().feedback(), Some("add examples"));
        assert!(matches!(controller.approve(), Err(BlogError::InvalidTransition { .. })));

        // Operator retries.
        assert_eq!(controller.revise(&pipeline).await.unwrap(), ReviewState::AwaitingReview);
        assert_eq!(controller.document().draft(), Some("Fixed post"));
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_feedback_revision() {
        let generator = Arc::new(ScriptedGenerator::replying(["Post"]));
        let pipeline = pipeline_with(generator.clone());
        let mut controller = ReviewController::new(drafted("Post"), 5).unwrap();

        controller.submit(ReviewDecision { approved: false, feedback: None }).unwrap();
        controller.revise(&pipeline).await.unwrap();

        assert_eq!(controller.document().draft(), Some("Post"));
        assert!(controller.document().feedback().is_none());
    }

    #[tokio::test]
    async fn test_revision_limit() {
        let generator = Arc::new(ScriptedGenerator::replying(["v2", "v3"]));
        let pipeline = pipeline_with(generator.clone());
        let mut controller = ReviewController::new(drafted("v1"), 2).unwrap();

        for feedback in ["a", "b"] {
            controller.reject(feedback).unwrap();
            controller.revise(&pipeline).await.unwrap();
        }

        assert_eq!(controller.reject("c").unwrap(), ReviewState::RevisionLimitReached);
        assert!(controller.state().is_terminal());
        assert_eq!(controller.document().draft(), Some("v3"));
        assert_eq!(controller.document().approved(), Some(false));
        assert!(controller.document().feedback().is_none());
        assert!(controller.revise(&pipeline).await.is_err());
        assert_eq!(generator.calls(), 2);
    }

    #[test]
    fn test_zero_revisions_allowed() {
        let mut controller = ReviewController::new(drafted("v1"), 0).unwrap();
        assert_eq!(controller.reject("no").unwrap(), ReviewState::RevisionLimitReached);
    }
}
