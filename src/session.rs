//! One interactive review session: prepare a draft, then loop on the
//! reviewer's decisions until the draft is approved or revisions run out.

use crate::document::DocumentState;
use crate::error::{BlogError, Result};
use crate::pipeline::Pipeline;
use crate::review::{ReviewController, ReviewDecision, ReviewState};
use tracing::{info, instrument};

/// Point in the session at which a document is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// First generated draft.
    Draft,
    /// The n-th revision.
    Revision(u32),
    /// Approved text.
    Final,
    /// Latest draft after the reviewer exhausted the revision budget.
    RevisionLimitReached,
}

/// The human-facing side of a session (terminal, web, tests).
///
/// Each revision is triggered by an explicit decision from the presenter;
/// the session never revises on its own.
pub trait Presenter {
    /// Show the document at a checkpoint.
    fn display_document(&mut self, document: &DocumentState, checkpoint: Checkpoint);

    /// Ask the reviewer to approve or reject the current draft.
    fn collect_approval(&mut self) -> Result<ReviewDecision>;

    /// Ask whether to retry after a failed revision.
    fn confirm_retry(&mut self, error: &BlogError) -> Result<bool>;

    /// Surface a stage failure.
    fn report_error(&mut self, error: &BlogError);
}

/// How a session ended.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub document: DocumentState,
    pub state: ReviewState,
    pub revisions: u32,
}

impl SessionOutcome {
    /// The approved draft, if the session ended in approval.
    pub fn approved_draft(&self) -> Option<&str> {
        match self.state {
            ReviewState::Approved => self.document.draft(),
            _ => None,
        }
    }
}

/// Run a full session for `reference`.
///
/// Preparation failures are reported to the presenter and returned. A failed
/// revision is reported and retried only if the presenter confirms; declining
/// ends the session in `Revising`.
#[instrument(skip(pipeline, presenter), fields(reference = %reference))]
pub async fn run_session<P: Presenter>(
    pipeline: &Pipeline,
    presenter: &mut P,
    reference: &str,
    max_revisions: u32,
) -> Result<SessionOutcome> {
    let document = match pipeline.prepare(reference).await {
        Ok(doc) => doc,
        Err(e) => {
            presenter.report_error(&e);
            return Err(e);
        }
    };

    let mut controller = ReviewController::new(document, max_revisions)?;
    presenter.display_document(controller.document(), Checkpoint::Draft);

    loop {
        match controller.state() {
            ReviewState::AwaitingReview => {
                let decision = presenter.collect_approval()?;
                controller.submit(decision)?;
            }
            ReviewState::Revising => match controller.revise(pipeline).await {
                Ok(_) => presenter.display_document(
                    controller.document(),
                    Checkpoint::Revision(controller.revisions()),
                ),
                Err(e) => {
                    presenter.report_error(&e);
                    if !presenter.confirm_retry(&e)? {
                        info!("Reviewer abandoned the session after a failed revision");
                        break;
                    }
                }
            },
            ReviewState::Approved => {
                presenter.display_document(controller.document(), Checkpoint::Final);
                break;
            }
            ReviewState::RevisionLimitReached => {
                presenter.display_document(
                    controller.document(),
                    Checkpoint::RevisionLimitReached,
                );
                break;
            }
        }
    }

    let state = controller.state();
    let revisions = controller.revisions();
    Ok(SessionOutcome {
        document: controller.into_document(),
        state,
        revisions,
    })
}
