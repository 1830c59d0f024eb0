//! Text generation backends.
//!
//! The language model is an opaque prompt-in, text-out collaborator. Each
//! pipeline receives its generator explicitly so sessions can be configured
//! independently and tests can substitute a scripted one.

mod ollama;
mod openai;

pub use ollama::OllamaGenerator;
pub use openai::OpenAIGenerator;

use crate::config::{GeneratorProvider, GeneratorSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for language model backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Name of the model behind this generator.
    fn model(&self) -> &str;
}

/// Build the generator selected in settings.
pub fn create_generator(settings: &GeneratorSettings) -> Result<Arc<dyn TextGenerator>> {
    let generator: Arc<dyn TextGenerator> = match settings.provider {
        GeneratorProvider::Ollama => Arc::new(OllamaGenerator::with_config(settings)?),
        GeneratorProvider::OpenAI => Arc::new(OpenAIGenerator::with_config(settings)?),
    };
    Ok(generator)
}
