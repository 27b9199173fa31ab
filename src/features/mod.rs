//! Feature definitions served by the coordinator.
//!
//! Each feature is a request type implementing [`Feature`]: it knows how to
//! validate itself, build its cache key, ask the prompt builder for its
//! prompt, parse provider text into its result type and produce a static
//! offline result.

pub mod daily_wisdom;
pub mod journal;
pub mod message;
pub mod prompts;
pub mod quote;
pub mod vocabulary;
pub mod weekly;

use crate::cache::{Cacheable, Namespace};
use crate::config::FeatureToggles;
use crate::error::Result;

pub use daily_wisdom::{DailyWisdom, DailyWisdomRequest};
pub use journal::{JournalInsight, JournalInsightRequest};
pub use message::{MessageHelp, MessageHelpRequest};
pub use prompts::{DefaultPrompts, PromptBuilder};
pub use quote::{QuoteExplanation, QuoteExplanationRequest};
pub use vocabulary::{VocabularyContext, VocabularyContextRequest};
pub use weekly::{WeeklyPattern, WeeklyPatternRequest};

/// A feature request the coordinator knows how to serve.
pub trait Feature: Send + Sync {
    /// Structured result handed back to the caller.
    type Output: Cacheable;

    /// Cache namespace, which also fixes the TTL and the prompt-type tag.
    const NAMESPACE: Namespace;

    /// Reject malformed input. This is the only failure callers ever see.
    fn validate(&self) -> Result<()>;

    /// Deterministic cache key for this request.
    fn cache_key(&self) -> String;

    /// Whether this feature's sub-toggle is on. The master switch is checked
    /// separately by the coordinator.
    fn is_enabled(&self, toggles: &FeatureToggles) -> bool;

    fn prompt(&self, prompts: &dyn PromptBuilder) -> String;

    /// Parse provider text, substituting literal defaults for missing fields.
    fn parse(&self, text: &str) -> Self::Output;

    /// Static result used when AI output is unavailable.
    fn fallback(&self) -> Self::Output;
}

/// Reject blank required text fields.
pub(crate) fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(crate::error::ProdyError::InvalidInput(format!(
            "{} must not be blank",
            field
        )));
    }
    Ok(())
}
