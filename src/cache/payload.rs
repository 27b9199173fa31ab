//! Registry of cacheable result types.
//!
//! Cached values are stored as a tagged union so that reading an entry back
//! into the wrong type is detected instead of silently misparsed. Adding a
//! new feature result means adding one variant and one `register_payloads!`
//! line.

use serde::{Deserialize, Serialize};

use crate::error::{ProdyError, Result};
use crate::features::{
    DailyWisdom, JournalInsight, MessageHelp, QuoteExplanation, VocabularyContext, WeeklyPattern,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CachedPayload {
    JournalInsight(JournalInsight),
    DailyWisdom(DailyWisdom),
    QuoteExplanation(QuoteExplanation),
    VocabularyContext(VocabularyContext),
    WeeklyPattern(WeeklyPattern),
    MessageHelp(MessageHelp),
}

/// A result type that can live in the response cache.
pub trait Cacheable: Clone + Send + Sync + 'static {
    fn into_payload(self) -> CachedPayload;

    /// `None` when the payload holds a different type.
    fn from_payload(payload: CachedPayload) -> Option<Self>;
}

macro_rules! register_payloads {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl Cacheable for $ty {
                fn into_payload(self) -> CachedPayload {
                    CachedPayload::$variant(self)
                }

                fn from_payload(payload: CachedPayload) -> Option<Self> {
                    match payload {
                        CachedPayload::$variant(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

register_payloads! {
    JournalInsight => JournalInsight,
    DailyWisdom => DailyWisdom,
    QuoteExplanation => QuoteExplanation,
    VocabularyContext => VocabularyContext,
    WeeklyPattern => WeeklyPattern,
    MessageHelp => MessageHelp,
}

/// Serialize a value into its stored form.
pub fn encode<T: Cacheable>(value: T) -> Result<String> {
    Ok(serde_json::to_string(&value.into_payload())?)
}

/// Decode a stored value into the caller's declared type.
pub fn decode<T: Cacheable>(raw: &str) -> Result<T> {
    let payload: CachedPayload = serde_json::from_str(raw)?;
    T::from_payload(payload)
        .ok_or_else(|| ProdyError::Cache("cached payload holds a different result type".into()))
}
