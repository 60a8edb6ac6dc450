//! Provider-agnostic LLM collaborator.
//!
//! The generation core depends only on [`LlmClient`]: a single
//! `invoke(prompt) -> text` operation with no vendor-specific shape.
//! [`OpenRouterClient`] is the production implementation, speaking the
//! OpenAI-compatible chat-completions protocol.
//!
//! Calls are blocking request-response with no internal retry: a failed call
//! surfaces immediately to the caller's failure-handling policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use tutorforge_shared::{LlmConfig, Result, TutorForgeError, resolve_api_key};

// ---------------------------------------------------------------------------
// LlmClient trait
// ---------------------------------------------------------------------------

/// A single-operation LLM collaborator.
///
/// The workflow is generic over this trait, so tests can substitute a
/// scripted implementation without any network access.
pub trait LlmClient: Send + Sync {
    /// Send one prompt and return the model's text response.
    fn invoke(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Wire types (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// OpenRouterClient
// ---------------------------------------------------------------------------

/// Chat-completions client for OpenRouter (or any OpenAI-compatible endpoint).
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenRouterClient {
    /// Create a client with explicit parameters.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TutorForgeError::Llm(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Create a client from config, reading the API key from the configured env var.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = resolve_api_key(config)?;
        Self::new(
            &config.base_url,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

impl LlmClient for OpenRouterClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let started = std::time::Instant::now();

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TutorForgeError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(TutorForgeError::Llm(format!("HTTP {status}: {snippet}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TutorForgeError::Llm(format!("invalid response body: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| TutorForgeError::Llm("response contained no choices".into()))?;

        debug!(
            latency_ms = started.elapsed().as_millis() as u64,
            response_len = text.len(),
            "llm call complete"
        );

        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
