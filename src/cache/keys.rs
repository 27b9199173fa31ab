//! Cache namespaces, their TTLs and key construction.
//!
//! Keys are deterministic and caller-defined. Three shapes are used:
//! content-hash (`journal_<16 hex>`), calendar-day (`daily_wisdom_2026-34`)
//! and composite (`weekly_2026-05-10_7`). The shape decides de-duplication:
//! identical content collapses to one slot, and daily content never collides
//! across days.

use chrono::{Datelike, Duration, NaiveDate};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from a content hash.
const CONTENT_HASH_LEN: usize = 16;

/// Feature namespace. Fixes the TTL, the key prefix and the prompt-type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    DailyWisdom,
    QuoteExplanation,
    JournalInsight,
    VocabularyContext,
    WeeklyPattern,
    MessageHelper,
}

impl Namespace {
    pub const ALL: [Namespace; 6] = [
        Namespace::DailyWisdom,
        Namespace::QuoteExplanation,
        Namespace::JournalInsight,
        Namespace::VocabularyContext,
        Namespace::WeeklyPattern,
        Namespace::MessageHelper,
    ];

    pub fn ttl(self) -> Duration {
        match self {
            Namespace::DailyWisdom => Duration::hours(24),
            Namespace::QuoteExplanation => Duration::days(7),
            Namespace::JournalInsight => Duration::days(30),
            Namespace::VocabularyContext => Duration::days(7),
            Namespace::WeeklyPattern => Duration::hours(12),
            Namespace::MessageHelper => Duration::hours(1),
        }
    }

    /// Tag recorded as the prompt type in usage stats.
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::DailyWisdom => "daily_wisdom",
            Namespace::QuoteExplanation => "quote_explanation",
            Namespace::JournalInsight => "journal_insight",
            Namespace::VocabularyContext => "vocabulary_context",
            Namespace::WeeklyPattern => "weekly_pattern",
            Namespace::MessageHelper => "message_helper",
        }
    }

    pub fn key_prefix(self) -> &'static str {
        match self {
            Namespace::DailyWisdom => "daily_wisdom",
            Namespace::QuoteExplanation => "quote",
            Namespace::JournalInsight => "journal",
            Namespace::VocabularyContext => "vocab",
            Namespace::WeeklyPattern => "weekly",
            Namespace::MessageHelper => "message",
        }
    }

    /// Whether `key` was built for this namespace.
    pub fn owns_key(self, key: &str) -> bool {
        key.strip_prefix(self.key_prefix())
            .is_some_and(|rest| rest.starts_with('_'))
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<prefix>_<sha256(parts)[..16]>`.
///
/// Parts are length-prefixed so `["a|b", ""]` and `["a", "b"]` never collide.
pub fn content_key(namespace: Namespace, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    format!(
        "{}_{}",
        namespace.key_prefix(),
        &digest[..CONTENT_HASH_LEN]
    )
}

/// `<prefix>_<year>-<day of year>`.
pub fn daily_key(namespace: Namespace, date: NaiveDate) -> String {
    format!(
        "{}_{}-{}",
        namespace.key_prefix(),
        date.year(),
        date.ordinal()
    )
}

/// `<prefix>_<YYYY-MM-DD>_<count>`.
pub fn composite_key(namespace: Namespace, date: NaiveDate, count: usize) -> String {
    format!(
        "{}_{}_{}",
        namespace.key_prefix(),
        date.format("%Y-%m-%d"),
        count
    )
}
