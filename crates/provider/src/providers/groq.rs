//! Groq provider implementation.
//!
//! Groq exposes an OpenAI-compatible chat completions endpoint:
//! https://console.groq.com/docs/api-reference

use crate::client::{GenRequest, GenResponse, GenUsage, TextProvider};
use serde::{Deserialize, Serialize};
use shopscout_core::{AppError, AppResult};
use std::time::Duration;

/// Chat completions request format.
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GroqMessage {
    role: &'static str,
    content: String,
}

/// Chat completions response format.
#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    #[serde(default)]
    usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct GroqChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Groq generative-text client.
pub struct GroqClient {
    /// Base URL for the Groq API
    base_url: String,

    /// API key, sent as a Bearer token
    api_key: String,

    /// Default model
    model: String,

    /// HTTP client with a bounded timeout
    client: reqwest::Client,
}

impl GroqClient {
    /// Create a new Groq client.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self::with_base_url("https://api.groq.com", api_key, model, timeout)
    }

    /// Create a new Groq client with a custom base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Convert GenRequest to chat completions format.
    fn to_groq_request(&self, request: &GenRequest) -> GroqRequest {
        let mut messages = Vec::new();
        if let Some(ref system) = request.system {
            messages.push(GroqMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(GroqMessage {
            role: "user",
            content: request.prompt.clone(),
        });

        GroqRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait::async_trait]
impl TextProvider for GroqClient {
    fn provider_name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenRequest) -> AppResult<GenResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Groq");

        let groq_request = self.to_groq_request(request);
        let url = format!("{}/openai/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&groq_request)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to send request to Groq: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if status.as_u16() == 429 || error_text.contains("rate_limit_exceeded") {
                return Err(AppError::ProviderQuota(format!(
                    "Groq quota exceeded ({}): {}",
                    status, error_text
                )));
            }

            return Err(AppError::Provider(format!(
                "Groq API error ({}): {}",
                status, error_text
            )));
        }

        let groq_response: GroqResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse Groq response: {}", e)))?;

        let content = groq_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AppError::Provider("Groq returned no choices".to_string()))?;

        let usage = groq_response
            .usage
            .map(|u| GenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        tracing::debug!(tokens = usage.total_tokens, "Received completion from Groq");

        Ok(GenResponse {
            content,
            model: request.model.clone(),
            usage,
        })
    }
}
