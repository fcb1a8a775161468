//! Inference gateway client
//!
//! Requirement analysis is delegated to a hosted generative model behind an
//! OpenAI-compatible chat-completions API (AI Builder Space). The service
//! only depends on the [`InferenceGateway`] trait; the live client here is
//! one implementation, tests inject doubles.

use async_trait::async_trait;
use reqflow_common::genome::RequirementGenome;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Gateway client errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Service is shedding load (HTTP 503). The message carries the
    /// "overloaded" marker the retry layer classifies as transient.
    #[error("Model overloaded, please retry")]
    Overloaded,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Completion envelope carried no message content
    #[error("No content returned from model")]
    MissingContent,

    /// Model output was not parseable as JSON
    #[error("Failed to parse model response as JSON: {0}")]
    MalformedJson(String),
}

/// Boundary to the generative inference service.
///
/// `generate` resolves to the structured JSON value the model produced for
/// the prompt, or fails. The state snapshot accompanies the prompt for
/// implementations that key on it. Implementations must be shareable across
/// concurrently running analysis tasks.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        state: &RequirementGenome,
    ) -> Result<Value, GatewayError>;
}

/// Chat-completion response envelope (OpenAI-compatible)
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_content(self) -> Result<String, GatewayError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or(GatewayError::MissingContent)
    }
}

/// Live client for the AI Builder Space platform
pub struct AiBuilderClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
    model: String,
}

impl AiBuilderClient {
    pub fn new(base_url: String, token: String, model: String) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            token,
            model,
        })
    }
}

#[async_trait]
impl InferenceGateway for AiBuilderClient {
    async fn generate(
        &self,
        prompt: &str,
        _state: &RequirementGenome,
    ) -> Result<Value, GatewayError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": 0.7,
            "max_tokens": 4096,
            // Gemini-specific settings pass through extra_body
            "extra_body": {
                "gemini": {
                    "response_mime_type": "application/json",
                    "thinking_config": {
                        "thinking_level": "HIGH"
                    }
                }
            }
        });

        let url = format!("{}/v1/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, url = %url, "Requesting analysis completion");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 503 {
            return Err(GatewayError::Overloaded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(status.as_u16(), error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let content = completion.into_content()?;

        serde_json::from_str(&content).map_err(|e| GatewayError::MalformedJson(e.to_string()))
    }
}
