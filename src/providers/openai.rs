//! OpenAI-compatible provider implementation for chatgate
//!
//! This module implements the Provider trait against any server exposing
//! the OpenAI chat-completions wire format, classifying transport and
//! status failures into the closed [`CompletionError`] set.

use crate::config::{ApiConfig, SamplingConfig};
use crate::error::{ChatgateError, Result};
use crate::providers::{Completion, CompletionError, Message, Provider};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider for OpenAI-compatible chat-completion endpoints
///
/// Sampling parameters are fixed at construction and passed through on
/// every request; the conversation supplied by the session layer is the
/// only per-call input.
pub struct OpenAiProvider {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    sampling: SamplingConfig,
}

/// Request body for the chat-completions endpoint
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

/// Response body from the chat-completions endpoint
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: ChatUsage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

/// Token usage block; absent fields default to zero
#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}

impl OpenAiProvider {
    /// Create a new provider instance from API configuration
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("chatgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatgateError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized completion provider: base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            sampling: config.sampling,
        })
    }

    /// The model requests are issued against
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn chat(&self, messages: &[Message]) -> std::result::Result<Completion, CompletionError> {
        let url = format!("{}/chat/completions", self.api_base);
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            frequency_penalty: self.sampling.frequency_penalty,
            presence_penalty: self.sampling.presence_penalty,
        };

        tracing::debug!("Submitting {} messages to {}", messages.len(), url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited(format!(
                "Service returned {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Completion endpoint returned {}: {}", status, body);
            return Err(CompletionError::Other(format!(
                "Unexpected status {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Other(format!("Failed to parse response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Other("Response contained no choices".to_string()))?;

        tracing::debug!(
            "Completion ok: completion_tokens={}, total_tokens={}",
            parsed.usage.completion_tokens,
            parsed.usage.total_tokens
        );

        Ok(Completion {
            content: choice.message.content,
            completion_tokens: parsed.usage.completion_tokens,
            total_tokens: parsed.usage.total_tokens,
        })
    }
}

/// Map a reqwest transport failure onto the closed error-kind set
///
/// Timeout is checked before connectivity: a timed-out connect attempt
/// reports both flags and the timeout policy (no retry, timeout reply)
/// is the one that applies.
fn classify_transport_error(error: reqwest::Error) -> CompletionError {
    if error.is_timeout() {
        CompletionError::Timeout(error.to_string())
    } else if error.is_connect() {
        CompletionError::Connectivity(error.to_string())
    } else {
        CompletionError::Other(error.to_string())
    }
}
