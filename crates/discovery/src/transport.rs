//! Network transport boundary for source adapters.
//!
//! Adapters own the parsing heuristics; the transport only moves bytes.
//! Keeping it behind a trait lets tests feed adapters recorded fixture
//! payloads instead of live pages.

use shopscout_core::{AppError, AppResult};
use std::time::Duration;

/// Raw payload retrieval for adapters.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the body at `url` as text (JSON or HTML).
    async fn fetch_text(&self, url: &str) -> AppResult<String>;
}

/// Production transport over reqwest with a bounded timeout.
///
/// A timeout surfaces as `SourceUnavailable`, identical to any other source
/// failure.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent("shopscout/0.1")
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, url: &str) -> AppResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::SourceUnavailable(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Body read failed: {}", e)))
    }
}

#[cfg(test)]
pub mod fixtures {
    //! Fixture transport for adapter tests.

    use super::*;
    use std::collections::HashMap;

    /// Transport that serves canned bodies by URL prefix.
    #[derive(Default)]
    pub struct StaticTransport {
        routes: HashMap<String, String>,
    }

    impl StaticTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Serve `body` for any URL starting with `prefix`.
        pub fn route(mut self, prefix: impl Into<String>, body: impl Into<String>) -> Self {
            self.routes.insert(prefix.into(), body.into());
            self
        }
    }

    #[async_trait::async_trait]
    impl Transport for StaticTransport {
        async fn fetch_text(&self, url: &str) -> AppResult<String> {
            self.routes
                .iter()
                .find(|(prefix, _)| url.starts_with(prefix.as_str()))
                .map(|(_, body)| body.clone())
                .ok_or_else(|| AppError::SourceUnavailable(format!("No fixture for {}", url)))
        }
    }
}
