//! Generative-text client abstraction and request/response types.
//!
//! This module defines the core abstractions for interacting with
//! generative-text providers. The broker treats providers as interchangeable
//! text oracles; transport details live in the implementations.

use serde::{Deserialize, Serialize};
use shopscout_core::AppResult;

/// Generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenRequest {
    /// The prompt text to send to the provider
    pub prompt: String,

    /// Model identifier (e.g., "gemini-2.0-flash", "llama-3.3-70b-versatile")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl GenRequest {
    /// Create a new generation request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            system: None,
        }
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Generation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: GenUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl GenUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for generative-text providers.
///
/// This trait abstracts the underlying provider (Gemini, Groq, etc.) and
/// provides a unified completion interface. Implementations map their
/// upstream quota/rate-limit signals to `AppError::ProviderQuota` so the
/// broker can drive cooldown and failover.
#[async_trait::async_trait]
pub trait TextProvider: Send + Sync {
    /// Get the provider name (e.g., "gemini", "groq").
    fn provider_name(&self) -> &str;

    /// Default model used when the broker builds requests.
    fn model(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn generate(&self, request: &GenRequest) -> AppResult<GenResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenRequest::new("Hello", "gemini-2.0-flash")
            .with_temperature(0.7)
            .with_max_tokens(256)
            .with_system("You are a shopping assistant");

        assert_eq!(request.prompt, "Hello");
        assert_eq!(request.model, "gemini-2.0-flash");
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(256));
        assert!(request.system.is_some());
    }

    #[test]
    fn test_usage_totals() {
        let usage = GenUsage::new(100, 50);
        assert_eq!(usage.total_tokens, 150);
    }
}
