//! Quota-aware broker over two interchangeable generative providers.
//!
//! The broker prefers the primary provider while it is active, fails over to
//! the secondary on a quota signal, and surfaces `AllProvidersExhausted`
//! when neither can take the call. Cooldown state is injected (see
//! [`ProviderState`]) so overlapping queries share it and tests can build
//! fresh state per case.

use crate::client::{GenRequest, TextProvider};
use crate::state::ProviderState;
use serde::de::DeserializeOwned;
use shopscout_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Broker over a primary and secondary generative provider.
pub struct ProviderBroker {
    primary: Arc<dyn TextProvider>,
    secondary: Arc<dyn TextProvider>,
    state: Arc<ProviderState>,
    cooldown: Duration,
}

impl ProviderBroker {
    /// Create a broker with injected cooldown state.
    pub fn new(
        primary: Arc<dyn TextProvider>,
        secondary: Arc<dyn TextProvider>,
        state: Arc<ProviderState>,
        cooldown: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            state,
            cooldown,
        }
    }

    /// The providers currently eligible for a call, in preference order.
    fn eligible(&self) -> Vec<Arc<dyn TextProvider>> {
        let mut out = Vec::with_capacity(2);
        if !self.state.is_on_cooldown(self.primary.provider_name()) {
            out.push(Arc::clone(&self.primary));
        }
        if !self.state.is_on_cooldown(self.secondary.provider_name()) {
            out.push(Arc::clone(&self.secondary));
        }
        out
    }

    /// Generate free text for a prompt.
    ///
    /// Selection: primary if active, else secondary, else
    /// `AllProvidersExhausted`. On a quota signal the failing provider is
    /// put on cooldown and the call is retried exactly once against the
    /// other provider if it is active. Non-quota errors propagate without
    /// a cooldown transition.
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        let candidates = self.eligible();
        if candidates.is_empty() {
            return Err(AppError::AllProvidersExhausted);
        }

        let mut candidates = candidates.into_iter();
        let Some(first) = candidates.next() else {
            return Err(AppError::AllProvidersExhausted);
        };

        let request = GenRequest::new(prompt, first.model()).with_temperature(0.7);
        match first.generate(&request).await {
            Ok(response) => Ok(response.content),
            Err(err) if err.is_quota() => {
                tracing::warn!(
                    provider = first.provider_name(),
                    "Quota signal, failing over"
                );
                self.state.mark_exceeded(first.provider_name(), self.cooldown);

                let Some(second) = candidates.next() else {
                    return Err(AppError::AllProvidersExhausted);
                };

                let retry = GenRequest::new(prompt, second.model()).with_temperature(0.7);
                match second.generate(&retry).await {
                    Ok(response) => Ok(response.content),
                    Err(err) if err.is_quota() => {
                        self.state
                            .mark_exceeded(second.provider_name(), self.cooldown);
                        Err(AppError::AllProvidersExhausted)
                    }
                    Err(err) => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Generate and strictly decode a JSON payload.
    ///
    /// Providers wrap JSON in prose or markdown fences more often than not;
    /// the raw text is trimmed down to its JSON body before decoding. A
    /// payload that does not decode into `T` is a `MalformedPayload`, never
    /// a partial result.
    pub async fn generate_json<T: DeserializeOwned>(&self, prompt: &str) -> AppResult<T> {
        let text = self.generate(prompt).await?;
        let json = extract_json(&text)
            .ok_or_else(|| AppError::MalformedPayload("No JSON body in response".to_string()))?;

        serde_json::from_str::<T>(json)
            .map_err(|e| AppError::MalformedPayload(format!("JSON validation failed: {}", e)))
    }
}

/// Extract the JSON body from provider text output.
///
/// Handles fenced blocks (```json ... ``` and bare ``` ... ```) and plain
/// output with leading/trailing prose around the first balanced object or
/// array.
pub fn extract_json(text: &str) -> Option<&str> {
    // Fenced block first
    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            let candidate = body[..end].trim();
            if !candidate.is_empty() {
                return Some(candidate);
            }
        }
    }

    // Fall back to the outermost object or array
    let open = text.find(['{', '['])?;
    let close_char = if text.as_bytes()[open] == b'{' { '}' } else { ']' };
    let close = text.rfind(close_char)?;
    if close > open {
        Some(text[open..=close].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{GenResponse, GenUsage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays a script of responses.
    struct ScriptedProvider {
        name: &'static str,
        script: Mutex<VecDeque<AppResult<String>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedProvider {
        fn new(name: &'static str, script: Vec<AppResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            })
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl TextProvider for ScriptedProvider {
        fn provider_name(&self) -> &str {
            self.name
        }

        fn model(&self) -> &str {
            "test-model"
        }

        async fn generate(&self, _request: &GenRequest) -> AppResult<GenResponse> {
            *self.calls.lock().unwrap() += 1;
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(AppError::Provider("script exhausted".into())));
            next.map(|content| GenResponse {
                content,
                model: "test-model".to_string(),
                usage: GenUsage::default(),
            })
        }
    }

    fn broker(
        primary: Arc<ScriptedProvider>,
        secondary: Arc<ScriptedProvider>,
    ) -> ProviderBroker {
        ProviderBroker::new(
            primary,
            secondary,
            Arc::new(ProviderState::new()),
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn test_primary_preferred_when_active() {
        let primary = ScriptedProvider::new("gemini", vec![Ok("hello".into())]);
        let secondary = ScriptedProvider::new("groq", vec![Ok("unused".into())]);

        let b = broker(Arc::clone(&primary), Arc::clone(&secondary));
        let out = b.generate("hi").await.unwrap();

        assert_eq!(out, "hello");
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 0);
    }

    #[tokio::test]
    async fn test_quota_fails_over_and_cools_primary() {
        let primary = ScriptedProvider::new(
            "gemini",
            vec![Err(AppError::ProviderQuota("429".into()))],
        );
        let secondary = ScriptedProvider::new("groq", vec![Ok("from groq".into())]);

        let state = Arc::new(ProviderState::new());
        let b = ProviderBroker::new(
            Arc::clone(&primary) as Arc<dyn TextProvider>,
            Arc::clone(&secondary) as Arc<dyn TextProvider>,
            Arc::clone(&state),
            Duration::from_secs(3600),
        );

        let out = b.generate("hi").await.unwrap();
        assert_eq!(out, "from groq");
        assert!(state.is_on_cooldown("gemini"));
        assert!(!state.is_on_cooldown("groq"));

        // Next call skips the cooled primary entirely.
        let _ = b.generate("hi again").await;
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 2);
    }

    #[tokio::test]
    async fn test_both_quota_is_exhausted() {
        let primary = ScriptedProvider::new(
            "gemini",
            vec![Err(AppError::ProviderQuota("429".into()))],
        );
        let secondary = ScriptedProvider::new(
            "groq",
            vec![Err(AppError::ProviderQuota("429".into()))],
        );

        let state = Arc::new(ProviderState::new());
        let b = ProviderBroker::new(
            primary,
            secondary,
            Arc::clone(&state),
            Duration::from_secs(3600),
        );

        let err = b.generate("hi").await.unwrap_err();
        assert!(matches!(err, AppError::AllProvidersExhausted));
        assert!(state.is_on_cooldown("gemini"));
        assert!(state.is_on_cooldown("groq"));

        // With both cooled, selection itself fails.
        let err = b.generate("hi").await.unwrap_err();
        assert!(matches!(err, AppError::AllProvidersExhausted));
    }

    #[tokio::test]
    async fn test_non_quota_error_propagates_without_cooldown() {
        let primary = ScriptedProvider::new(
            "gemini",
            vec![Err(AppError::Provider("boom".into()))],
        );
        let secondary = ScriptedProvider::new("groq", vec![Ok("unused".into())]);

        let state = Arc::new(ProviderState::new());
        let b = ProviderBroker::new(
            primary,
            Arc::clone(&secondary) as Arc<dyn TextProvider>,
            Arc::clone(&state),
            Duration::from_secs(3600),
        );

        let err = b.generate("hi").await.unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
        assert!(!state.is_on_cooldown("gemini"));
        assert_eq!(secondary.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_json_fenced() {
        let primary = ScriptedProvider::new(
            "gemini",
            vec![Ok("Here you go:\n```json\n{\"a\": 1}\n```".into())],
        );
        let secondary = ScriptedProvider::new("groq", vec![]);

        let b = broker(primary, secondary);
        let value: serde_json::Value = b.generate_json("hi").await.unwrap();
        assert_eq!(value["a"], 1);
    }

    #[tokio::test]
    async fn test_generate_json_malformed() {
        let primary = ScriptedProvider::new("gemini", vec![Ok("not json at all".into())]);
        let secondary = ScriptedProvider::new("groq", vec![]);

        let b = broker(primary, secondary);
        let err = b
            .generate_json::<serde_json::Value>("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(_)));
    }

    #[test]
    fn test_extract_json_plain() {
        let text = "The list is [1, 2, 3] as requested.";
        assert_eq!(extract_json(text), Some("[1, 2, 3]"));
    }

    #[test]
    fn test_extract_json_bare_fence() {
        let text = "```\n{\"k\": \"v\"}\n```";
        assert_eq!(extract_json(text), Some("{\"k\": \"v\"}"));
    }

    #[test]
    fn test_extract_json_object_with_prose() {
        let text = "Sure! {\"name\": \"Watch\", \"price\": 199.0} Hope that helps.";
        assert_eq!(
            extract_json(text),
            Some("{\"name\": \"Watch\", \"price\": 199.0}")
        );
    }
}
