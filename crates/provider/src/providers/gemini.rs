//! Gemini provider implementation.
//!
//! Generative Language API: https://ai.google.dev/api/generate-content

use crate::client::{GenRequest, GenResponse, GenUsage, TextProvider};
use serde::{Deserialize, Serialize};
use shopscout_core::{AppError, AppResult};
use std::time::Duration;

/// Gemini API request format.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

/// Gemini generative-text client.
pub struct GeminiClient {
    /// Base URL for the Generative Language API
    base_url: String,

    /// API key, sent as a query parameter
    api_key: String,

    /// Default model
    model: String,

    /// HTTP client with a bounded timeout
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self::with_base_url(
            "https://generativelanguage.googleapis.com",
            api_key,
            model,
            timeout,
        )
    }

    /// Create a new Gemini client with a custom base URL.
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

    /// Convert GenRequest to Gemini format.
    fn to_gemini_request(&self, request: &GenRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction: request.system.as_ref().map(|s| GeminiContent {
                parts: vec![GeminiPart { text: s.clone() }],
            }),
            generation_config: Some(GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            }),
        }
    }
}

#[async_trait::async_trait]
impl TextProvider for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenRequest) -> AppResult<GenResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Gemini");

        let gemini_request = self.to_gemini_request(request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to send request to Gemini: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            // 429 and RESOURCE_EXHAUSTED both mean the daily/minute quota
            // is gone; the broker puts us on cooldown for either.
            if status.as_u16() == 429 || error_text.contains("RESOURCE_EXHAUSTED") {
                return Err(AppError::ProviderQuota(format!(
                    "Gemini quota exceeded ({}): {}",
                    status, error_text
                )));
            }

            return Err(AppError::Provider(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse Gemini response: {}", e)))?;

        let content = gemini_response
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .ok_or_else(|| AppError::Provider("Gemini returned no candidates".to_string()))?;

        let usage = gemini_response
            .usage_metadata
            .map(|u| GenUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        tracing::debug!(tokens = usage.total_tokens, "Received completion from Gemini");

        Ok(GenResponse {
            content,
            model: request.model.clone(),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_client_creation() {
        let client = GeminiClient::new("key", "gemini-2.0-flash", Duration::from_secs(20));
        assert_eq!(client.provider_name(), "gemini");
        assert_eq!(client.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_gemini_request_conversion() {
        let client = GeminiClient::new("key", "gemini-2.0-flash", Duration::from_secs(20));
        let request = GenRequest::new("Hello", "gemini-2.0-flash")
            .with_temperature(0.4)
            .with_system("sys");

        let gemini_req = client.to_gemini_request(&request);
        assert_eq!(gemini_req.contents[0].parts[0].text, "Hello");
        assert!(gemini_req.system_instruction.is_some());
        assert_eq!(
            gemini_req.generation_config.as_ref().unwrap().temperature,
            Some(0.4)
        );
    }
}
