//! Generative-provider crate for the ShopScout pipeline.
//!
//! This crate provides a provider-agnostic abstraction over the two
//! generative-text services the pipeline depends on, plus the quota-aware
//! broker that fails over between them.
//!
//! # Providers
//! - **Gemini**: Generative Language API (primary by default)
//! - **Groq**: OpenAI-compatible chat completions (secondary)
//!
//! # Example
//! ```no_run
//! use shopscout_provider::{ProviderBroker, ProviderState, providers::GeminiClient, providers::GroqClient};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let timeout = Duration::from_secs(20);
//! let broker = ProviderBroker::new(
//!     Arc::new(GeminiClient::new("key-a", "gemini-2.0-flash", timeout)),
//!     Arc::new(GroqClient::new("key-b", "llama-3.3-70b-versatile", timeout)),
//!     Arc::new(ProviderState::new()),
//!     Duration::from_secs(3600),
//! );
//! let text = broker.generate("Summarize this product").await?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod client;
pub mod factory;
pub mod providers;
pub mod state;

// Re-export main types
pub use broker::{extract_json, ProviderBroker};
pub use client::{GenRequest, GenResponse, GenUsage, TextProvider};
pub use factory::{create_broker, create_provider};
pub use state::ProviderState;
