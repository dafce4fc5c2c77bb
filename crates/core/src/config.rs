//! Configuration management for the ShopScout pipeline.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (shopscout.yaml)
//!
//! Credential presence is surfaced here as explicit fields; the pipeline
//! itself never reads environment variables to change control flow.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// One instance is built at startup and passed into the pipeline's
/// constructor. Tests construct it directly with `AppConfig::default()`
/// plus field overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the paid structured shopping API. When absent, the
    /// router uses the lightweight web-search adapter instead.
    pub structured_api_key: Option<String>,

    /// Endpoint for the structured shopping API
    pub structured_endpoint: String,

    /// Endpoint for the lightweight search/shopping service
    pub search_endpoint: String,

    /// Primary generative provider ("gemini" or "groq")
    pub primary_provider: String,

    /// Secondary generative provider, used on failover
    pub secondary_provider: String,

    /// Model for the primary provider
    pub primary_model: String,

    /// Model for the secondary provider
    pub secondary_model: String,

    /// API key for the primary provider
    pub primary_api_key: Option<String>,

    /// API key for the secondary provider
    pub secondary_api_key: Option<String>,

    /// Cooldown window after a quota signal, in seconds
    pub cooldown_secs: u64,

    /// Per-request network timeout, in seconds
    pub request_timeout_secs: u64,

    /// Width of the bounded parallel map used for detail hydration
    pub detail_concurrency: usize,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    sources: Option<SourcesConfig>,
    providers: Option<ProvidersConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SourcesConfig {
    #[serde(rename = "structuredEndpoint")]
    structured_endpoint: Option<String>,
    #[serde(rename = "searchEndpoint")]
    search_endpoint: Option<String>,
    #[serde(rename = "requestTimeoutSecs")]
    request_timeout_secs: Option<u64>,
    #[serde(rename = "detailConcurrency")]
    detail_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProvidersConfig {
    primary: Option<ProviderEntry>,
    secondary: Option<ProviderEntry>,
    #[serde(rename = "cooldownSecs")]
    cooldown_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProviderEntry {
    name: String,
    model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            structured_api_key: None,
            structured_endpoint: "https://api.structured-shopping.example/v1/search".to_string(),
            search_endpoint: "https://api.websearch.example/shopping".to_string(),
            primary_provider: "gemini".to_string(),
            secondary_provider: "groq".to_string(),
            primary_model: "gemini-2.0-flash".to_string(),
            secondary_model: "llama-3.3-70b-versatile".to_string(),
            primary_api_key: None,
            secondary_api_key: None,
            cooldown_secs: 3600,
            request_timeout_secs: 20,
            detail_concurrency: 4,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `SHOPSCOUT_CONFIG`: Path to a YAML config file
    /// - `SHOPSCOUT_STRUCTURED_API_KEY`: Structured shopping API credential
    /// - `SHOPSCOUT_PRIMARY_API_KEY` / `SHOPSCOUT_SECONDARY_API_KEY`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        // YAML config first, so env vars can override it
        if let Ok(path) = std::env::var("SHOPSCOUT_CONFIG") {
            config = config.merge_yaml(&path)?;
        } else if std::path::Path::new("shopscout.yaml").exists() {
            config = config.merge_yaml("shopscout.yaml")?;
        }

        config.structured_api_key = std::env::var("SHOPSCOUT_STRUCTURED_API_KEY")
            .ok()
            .or(config.structured_api_key);
        config.primary_api_key = std::env::var("SHOPSCOUT_PRIMARY_API_KEY")
            .ok()
            .or(config.primary_api_key);
        config.secondary_api_key = std::env::var("SHOPSCOUT_SECONDARY_API_KEY")
            .ok()
            .or(config.secondary_api_key);

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &str) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(sources) = config_file.sources {
            if let Some(endpoint) = sources.structured_endpoint {
                result.structured_endpoint = endpoint;
            }
            if let Some(endpoint) = sources.search_endpoint {
                result.search_endpoint = endpoint;
            }
            if let Some(timeout) = sources.request_timeout_secs {
                result.request_timeout_secs = timeout;
            }
            if let Some(width) = sources.detail_concurrency {
                result.detail_concurrency = width;
            }
        }

        if let Some(providers) = config_file.providers {
            if let Some(primary) = providers.primary {
                result.primary_provider = primary.name;
                if let Some(model) = primary.model {
                    result.primary_model = model;
                }
            }
            if let Some(secondary) = providers.secondary {
                result.secondary_provider = secondary.name;
                if let Some(model) = secondary.model {
                    result.secondary_model = model;
                }
            }
            if let Some(cooldown) = providers.cooldown_secs {
                result.cooldown_secs = cooldown;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and config
    /// files.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Whether the paid structured shopping API can be used.
    pub fn has_structured_credential(&self) -> bool {
        self.structured_api_key
            .as_deref()
            .map(|k| !k.is_empty())
            .unwrap_or(false)
    }

    /// Validate configuration for the configured providers.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["gemini", "groq"];

        for provider in [&self.primary_provider, &self.secondary_provider] {
            if !known_providers.contains(&provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown provider: {}. Supported: {}",
                    provider,
                    known_providers.join(", ")
                )));
            }
        }

        if self.primary_provider == self.secondary_provider {
            return Err(AppError::Config(
                "Primary and secondary providers must differ for failover".to_string(),
            ));
        }

        if self.detail_concurrency == 0 {
            return Err(AppError::Config(
                "detail_concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.primary_provider, "gemini");
        assert_eq!(config.secondary_provider, "groq");
        assert_eq!(config.cooldown_secs, 3600);
        assert!(!config.has_structured_credential());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(None, true, true);
        assert!(config.verbose);
        assert!(config.no_color);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_structured_credential() {
        let mut config = AppConfig::default();
        config.structured_api_key = Some("key-123".to_string());
        assert!(config.has_structured_credential());

        config.structured_api_key = Some(String::new());
        assert!(!config.has_structured_credential());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.primary_provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_same_provider_twice() {
        let mut config = AppConfig::default();
        config.secondary_provider = "gemini".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ok() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
