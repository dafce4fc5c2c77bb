//! Quota/cooldown state for generative providers.
//!
//! One `ProviderState` instance is shared by all queries in the process and
//! injected into the broker, so tests can construct fresh state per case
//! instead of touching module-level globals.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-provider cooldown timestamps.
///
/// A provider is `Active` unless it has a cooldown entry whose deadline is
/// in the future. Expiry is checked lazily on the next selection; there is
/// no background timer.
///
/// Concurrent queries may both observe a quota signal and write overlapping
/// cooldown windows. Last-write-wins is the accepted correctness model for
/// this state: a second write can only extend or overwrite the window
/// harmlessly.
#[derive(Debug, Default)]
pub struct ProviderState {
    cooldowns: Mutex<HashMap<String, Instant>>,
}

impl ProviderState {
    /// Create fresh state with all providers active.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the named provider is currently on cooldown.
    ///
    /// Expired entries are removed here rather than by a timer.
    pub fn is_on_cooldown(&self, provider: &str) -> bool {
        let mut cooldowns = self.cooldowns.lock().unwrap_or_else(|e| e.into_inner());
        match cooldowns.get(provider) {
            Some(until) if *until > Instant::now() => true,
            Some(_) => {
                cooldowns.remove(provider);
                false
            }
            None => false,
        }
    }

    /// Put the named provider on cooldown for the given window.
    pub fn mark_exceeded(&self, provider: &str, window: Duration) {
        let until = Instant::now() + window;
        let mut cooldowns = self.cooldowns.lock().unwrap_or_else(|e| e.into_inner());
        cooldowns.insert(provider.to_string(), until);
        tracing::warn!(provider, window_secs = window.as_secs(), "Provider on cooldown");
    }

    /// Clear any cooldown for the named provider.
    pub fn reset(&self, provider: &str) {
        let mut cooldowns = self.cooldowns.lock().unwrap_or_else(|e| e.into_inner());
        cooldowns.remove(provider);
    }
}
