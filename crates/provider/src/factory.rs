//! Provider factory.
//!
//! Builds provider clients and the broker from application configuration.
//! Secrets come in through `AppConfig`; nothing here reads the environment.

use crate::broker::ProviderBroker;
use crate::client::TextProvider;
use crate::providers::{GeminiClient, GroqClient};
use crate::state::ProviderState;
use shopscout_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a single provider client by name.
///
/// # Errors
/// Returns an error if the provider is unknown or its API key is missing.
pub fn create_provider(
    provider: &str,
    model: &str,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn TextProvider>> {
    match provider.to_lowercase().as_str() {
        "gemini" => {
            let key = api_key
                .ok_or_else(|| AppError::Config("Gemini provider requires API key".to_string()))?;
            Ok(Arc::new(GeminiClient::new(key, model, timeout)))
        }
        "groq" => {
            let key = api_key
                .ok_or_else(|| AppError::Config("Groq provider requires API key".to_string()))?;
            Ok(Arc::new(GroqClient::new(key, model, timeout)))
        }
        other => Err(AppError::Config(format!("Unknown provider: {}", other))),
    }
}

/// Build the broker for the configured primary/secondary pair with fresh
/// cooldown state.
pub fn create_broker(config: &AppConfig) -> AppResult<ProviderBroker> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let primary = create_provider(
        &config.primary_provider,
        &config.primary_model,
        config.primary_api_key.as_deref(),
        timeout,
    )?;
    let secondary = create_provider(
        &config.secondary_provider,
        &config.secondary_model,
        config.secondary_api_key.as_deref(),
        timeout,
    )?;

    Ok(ProviderBroker::new(
        primary,
        secondary,
        Arc::new(ProviderState::new()),
        Duration::from_secs(config.cooldown_secs),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gemini() {
        let client = create_provider("gemini", "gemini-2.0-flash", Some("k"), Duration::from_secs(5));
        assert!(client.is_ok());
        assert_eq!(client.unwrap().provider_name(), "gemini");
    }

    #[test]
    fn test_gemini_requires_api_key() {
        match create_provider("gemini", "gemini-2.0-flash", None, Duration::from_secs(5)) {
            Err(err) => assert!(err.to_string().contains("requires API key")),
            Ok(_) => panic!("Expected error for Gemini without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_provider("unknown", "m", Some("k"), Duration::from_secs(5)) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }

    #[test]
    fn test_create_broker() {
        let mut config = AppConfig::default();
        config.primary_api_key = Some("k1".to_string());
        config.secondary_api_key = Some("k2".to_string());
        assert!(create_broker(&config).is_ok());
    }

    #[test]
    fn test_create_broker_missing_key() {
        let config = AppConfig::default();
        assert!(create_broker(&config).is_err());
    }
}
