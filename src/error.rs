//! Error types for ytblog.

use crate::pipeline::Stage;
use crate::review::ReviewState;
use thiserror::Error;

/// Library-level error type for ytblog operations.
#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Extract stage failed: {0}")]
    Extraction(Box<BlogError>),

    #[error("{stage} stage failed: {cause}")]
    Generation { stage: Stage, cause: Box<BlogError> },

    /// A stage ran before its predecessor produced the input it needs.
    #[error("{stage} stage invoked without {missing}")]
    Validation { stage: Stage, missing: &'static str },

    #[error("Cannot apply '{event}' while {state}")]
    InvalidTransition { state: ReviewState, event: String },

    #[error("Transcript not found: {0}")]
    TranscriptNotFound(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("Invalid video reference: {0}")]
    InvalidReference(String),

    #[error("Text generator error: {0}")]
    Generator(String),

    #[error("Text generator returned an empty response")]
    EmptyResponse,

    #[error("Text generator timed out after {0} seconds")]
    Timeout(u64),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BlogError {
    /// Wrap a collaborator failure as a stage failure.
    pub fn generation(stage: Stage, cause: BlogError) -> Self {
        BlogError::Generation {
            stage,
            cause: Box::new(cause),
        }
    }

    /// Wrap a transcript failure as an extraction failure.
    pub fn extraction(cause: BlogError) -> Self {
        BlogError::Extraction(Box::new(cause))
    }

    /// The pipeline stage this error belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BlogError::Extraction(_) => Some(Stage::Extract),
            BlogError::Generation { stage, .. } | BlogError::Validation { stage, .. } => {
                Some(*stage)
            }
            _ => None,
        }
    }
}

/// Result type alias for ytblog operations.
pub type Result<T> = std::result::Result<T, BlogError>;
