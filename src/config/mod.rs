//! Configuration module for ytblog.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{BlogPrompts, Prompts};
pub use settings::{
    GeneralSettings, GeneratorProvider, GeneratorSettings, PromptSettings, ReviewSettings,
    ServerSettings, Settings, TranscriptSettings,
};
