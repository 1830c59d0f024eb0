//! ytblog - YouTube videos to blog posts, with a human in the loop
//!
//! Fetches a video's transcript, summarizes it with a language model, drafts
//! a blog post, and lets a reviewer request revisions until the post is approved.
//!
//! # Architecture
//!
//! - `transcript_source` - Video reference parsing and caption retrieval
//! - `generator` - Language model backends (Ollama, OpenAI)
//! - `document` - The record threaded through every stage
//! - `pipeline` - Extract, summarize, draft and revise stages
//! - `review` - The approve / reject / revise state machine
//! - `session` - Drives a review session against a presenter
//! - `cli` - Terminal and HTTP presenters
//! - `config` - Settings and prompt templates
//!
//! # Example
//!
//! ```rust,no_run
//! use ytblog::cli::commands::build_pipeline;
//! use ytblog::config::Settings;
//! use ytblog::review::ReviewController;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = build_pipeline(&settings)?;
//!
//!     let document = pipeline.prepare("https://youtu.be/dQw4w9WgXcQ").await?;
//!     let mut review = ReviewController::new(document, settings.review.max_revisions)?;
//!
//!     review.reject("Add a section on the history of the song")?;
//!     review.revise(&pipeline).await?;
//!     review.approve()?;
//!
//!     println!("{}", review.document().draft().unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod generator;
pub mod openai;
pub mod pipeline;
pub mod review;
pub mod session;
pub mod transcript_source;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{BlogError, Result};
