//! Generative-text providers and the limits that gate them.
//!
//! The core only ever talks to providers through [`ProviderClient`]. Two
//! instances (primary and secondary) are handed to the
//! [`crate::orchestrator::FallbackOrchestrator`] by whoever wires the
//! coordinator; the adapters in this module are what the CLI uses.

pub mod gemini;
pub mod openrouter;
pub mod rate_limit;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ProdyError, Result};

pub use gemini::GeminiProvider;
pub use openrouter::OpenRouterProvider;
pub use rate_limit::{RateLimitUsage, RateLimiter};

/// A text generation backend.
///
/// Implementations own their own timeouts; a timeout is reported as an
/// ordinary `Err`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Short identifier used in logs and status output.
    fn name(&self) -> &str;

    /// Whether a credential is available. Unconfigured providers are skipped.
    fn is_configured(&self) -> bool;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Position of a provider in the fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderSlot {
    Primary,
    Secondary,
}

impl ProviderSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderSlot::Primary => "primary",
            ProviderSlot::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for ProviderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Outcome of a single provider call.
#[derive(Debug)]
pub enum ProviderResult {
    Success(String),
    Failure(ProdyError),
    NotConfigured,
}

/// Call `client` unless it is unconfigured, folding every outcome into a
/// [`ProviderResult`]. Never returns an error.
pub async fn call_provider(client: &dyn ProviderClient, prompt: &str) -> ProviderResult {
    if !client.is_configured() {
        debug!(provider = %client.name(), "Provider not configured, skipping");
        return ProviderResult::NotConfigured;
    }
    match client.generate(prompt).await {
        Ok(text) => ProviderResult::Success(text),
        Err(e) => ProviderResult::Failure(e),
    }
}

/// Map an HTTP error status and body onto a provider error.
pub fn parse_provider_error(status: u16, body: &str) -> ProdyError {
    let kind = match status {
        401 | 403 => "authentication failed",
        404 => "model or endpoint not found",
        408 => "request timed out",
        429 => "provider rate limit or quota exceeded",
        500..=599 => "provider server error",
        _ => "request rejected",
    };
    ProdyError::Provider(format!("{} (HTTP {}): {}", kind, status, body.trim()))
}
