//! Error types for the ShopScout pipeline.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, source adapters, generative
//! providers, and payload validation.

use thiserror::Error;

/// Unified error type for the ShopScout pipeline.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
///
/// Note that "no results found" is deliberately absent: an empty result set
/// with an accurate data-source classification is a valid response, not an
/// error.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One upstream source (structured API, web search, detail page) failed.
    /// Always recovered by isolation: the adapter contributes an empty list.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A generative provider signaled a quota/rate limit. Triggers a
    /// cooldown transition in the broker and a single failover attempt.
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Both generative providers are unavailable (cooldown or failure).
    /// Callers degrade locally (heuristic enrichment, empty synthetic list).
    #[error("All generative providers exhausted")]
    AllProvidersExhausted,

    /// Generative output failed JSON extraction or schema validation.
    /// Treated the same as exhaustion for that call.
    #[error("Malformed upstream payload: {0}")]
    MalformedPayload(String),

    /// Non-quota provider transport or API errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error is a quota/rate-limit signal that should put the
    /// originating provider on cooldown.
    pub fn is_quota(&self) -> bool {
        matches!(self, AppError::ProviderQuota(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
