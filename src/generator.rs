//! Text generation through a local Ollama server.
//!
//! # Architecture
//!
//! - [`Generator`]: the capability the pipeline depends on
//! - [`OllamaGenerator`]: `POST /api/generate` with a non-streaming request
//!
//! Generation is not retried. A failed article is skipped and the run moves
//! on to the next one.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Timeout for the pre-flight `/api/tags` probe.
pub const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generation backend returned HTTP {0}")]
    Status(u16),
    #[error("generation backend returned an empty response")]
    Empty,
}

/// Something that turns a prompt into raw text.
pub trait Generator {
    /// Generate text for `prompt`.
    ///
    /// # Arguments
    ///
    /// * `prompt` - The full prompt, persona included
    ///
    /// # Returns
    ///
    /// The raw model output, or an error if nothing usable came back.
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct SamplingOptions {
    temperature: f64,
    top_p: f64,
}

/// High temperature keeps posts varied from run to run.
const SAMPLING: SamplingOptions = SamplingOptions {
    temperature: 1.0,
    top_p: 0.95,
};

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Client for an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaGenerator {
    /// # Arguments
    ///
    /// * `base_url` - Server root, e.g. `http://localhost:11434`
    /// * `model` - Model name as listed by `ollama list`
    /// * `timeout` - Per-request generation timeout
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>, GenerateError> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PREFLIGHT_TIMEOUT)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GenerateError::Status(resp.status().as_u16()));
        }
        let tags: TagsResponse = resp.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// `true` when the server answers `/api/tags`.
    #[instrument(level = "info", skip(self), fields(url = %self.base_url))]
    pub async fn check_connection(&self) -> bool {
        match self.list_models().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Ollama is not reachable");
                false
            }
        }
    }

    /// `true` when some installed model name starts with `name`, so `gemma3`
    /// matches `gemma3:4b`.
    #[instrument(level = "info", skip(self), fields(url = %self.base_url))]
    pub async fn has_model(&self, name: &str) -> bool {
        match self.list_models().await {
            Ok(models) => {
                debug!(?models, "Installed models");
                models.iter().any(|m| m.starts_with(name))
            }
            Err(e) => {
                warn!(error = %e, "Could not list Ollama models");
                false
            }
        }
    }
}

impl Generator for OllamaGenerator {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let t0 = Instant::now();
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: SAMPLING,
        };

        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GenerateError::Status(resp.status().as_u16()));
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed.response.trim().to_string();
        if text.is_empty() {
            return Err(GenerateError::Empty);
        }

        if !text.contains('\n') {
            debug!("Model output has no line breaks");
        }
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            chars = text.chars().count(),
            "Generated text"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(server: &MockServer) -> OllamaGenerator {
        OllamaGenerator::new(server.uri(), "gemma3:4b", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_generate_sends_sampling_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "gemma3:4b",
                "prompt": "write a post",
                "stream": false,
                "options": { "temperature": 1.0, "top_p": 0.95 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gemma3:4b",
                "response": "  Linux wins again 🐧\nWho is switching? #Technews \n",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = generator(&server).generate("write a post").await.unwrap();
        assert_eq!(text, "Linux wins again 🐧\nWho is switching? #Technews");
    }

    #[tokio::test]
    async fn test_generate_blank_response_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "   " })))
            .mount(&server)
            .await;

        let err = generator(&server).generate("p").await.unwrap_err();
        assert!(matches!(err, GenerateError::Empty));
    }

    #[tokio::test]
    async fn test_generate_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let err = generator(&server).generate("p").await.unwrap_err();
        assert!(matches!(err, GenerateError::Status(404)));
    }

    #[tokio::test]
    async fn test_preflight_checks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{ "name": "gemma3:4b" }, { "name": "llama3.2:3b" }]
            })))
            .mount(&server)
            .await;

        let generator = generator(&server);
        assert!(generator.check_connection().await);
        assert!(generator.has_model("gemma3").await);
        assert!(generator.has_model("gemma3:4b").await);
        assert!(!generator.has_model("mistral").await);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let generator = OllamaGenerator::new("http://127.0.0.1:9", "gemma3:4b", Duration::from_secs(1));
        assert!(!generator.check_connection().await);
    }
}
