//! Ollama generator over its HTTP API.

use super::TextGenerator;
use crate::config::GeneratorSettings;
use crate::error::{BlogError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Generator backed by a local Ollama server (`POST /api/generate`).
pub struct OllamaGenerator {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl OllamaGenerator {
    pub fn with_config(settings: &GeneratorSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.ollama_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self.http.post(self.endpoint()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(BlogError::Generator(format!(
                "Ollama returned {}: {}",
                status, message
            )));
        }

        let body: GenerateResponse = response.json().await?;
        debug!("Generated {} characters", body.response.len());
        Ok(body.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let settings = GeneratorSettings {
            ollama_url: "http://gpu-box:11434/".to_string(),
            ..Default::default()
        };
        let generator = OllamaGenerator::with_config(&settings).unwrap();
        assert_eq!(generator.endpoint(), "http://gpu-box:11434/api/generate");
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            model: "llama3.2:1b",
            prompt: "hi",
            stream: false,
            options: GenerateOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.2:1b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.5);
    }
}
