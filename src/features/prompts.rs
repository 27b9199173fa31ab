//! Prompt builder seam.
//!
//! Prompt wording is owned by the embedding application. The coordinator
//! treats prompts as opaque strings; [`DefaultPrompts`] exists so the crate
//! works standalone and asks for each feature's labels.

use super::{
    daily_wisdom, journal, message, quote, vocabulary, weekly, DailyWisdomRequest,
    JournalInsightRequest, MessageHelpRequest, QuoteExplanationRequest,
    VocabularyContextRequest, WeeklyPatternRequest,
};

/// Assembles the base prompt for each feature.
pub trait PromptBuilder: Send + Sync {
    fn journal_insight(&self, req: &JournalInsightRequest) -> String;
    fn daily_wisdom(&self, req: &DailyWisdomRequest) -> String;
    fn quote_explanation(&self, req: &QuoteExplanationRequest) -> String;
    fn vocabulary_context(&self, req: &VocabularyContextRequest) -> String;
    fn weekly_pattern(&self, req: &WeeklyPatternRequest) -> String;
    fn message_help(&self, req: &MessageHelpRequest) -> String;
}

/// Minimal built-in prompts.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPrompts;

fn format_instructions(labels: &[&str]) -> String {
    format!(
        "Answer using exactly these labels, each on its own line: {}",
        labels.join(" ")
    )
}

impl PromptBuilder for DefaultPrompts {
    fn journal_insight(&self, req: &JournalInsightRequest) -> String {
        let mood = req
            .mood
            .as_deref()
            .map(|m| format!("The writer tagged their mood as: {}.\n", m))
            .unwrap_or_default();
        format!(
            "Read this journal entry and reflect it back with care.\n{}Entry:\n\"\"\"\n{}\n\"\"\"\n{}\n\
             THEMES should be a short comma-separated list.",
            mood,
            req.content.trim(),
            format_instructions(journal::LABELS)
        )
    }

    fn daily_wisdom(&self, req: &DailyWisdomRequest) -> String {
        format!(
            "Offer one piece of grounded wisdom for {}. Keep it short and practical.\n{}",
            req.date.format("%A, %B %-d"),
            format_instructions(daily_wisdom::LABELS)
        )
    }

    fn quote_explanation(&self, req: &QuoteExplanationRequest) -> String {
        let author = req
            .author
            .as_deref()
            .map(|a| format!(" by {}", a))
            .unwrap_or_default();
        format!(
            "Explain the quote \"{}\"{} in plain words and how to live it today.\n{}",
            req.quote.trim(),
            author,
            format_instructions(quote::LABELS)
        )
    }

    fn vocabulary_context(&self, req: &VocabularyContextRequest) -> String {
        let definition = req
            .definition
            .as_deref()
            .map(|d| format!(" (meaning: {})", d))
            .unwrap_or_default();
        format!(
            "Help me learn the word \"{}\"{}. Give two or three example sentences as a list.\n{}",
            req.word.trim(),
            definition,
            format_instructions(vocabulary::LABELS)
        )
    }

    fn weekly_pattern(&self, req: &WeeklyPatternRequest) -> String {
        let entries = req
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {}", i + 1, e.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Here are my journal entries for the week ending {}:\n{}\n\
             Describe the patterns you notice. PATTERNS should be a short list.\n{}",
            req.week_ending,
            entries,
            format_instructions(weekly::LABELS)
        )
    }

    fn message_help(&self, req: &MessageHelpRequest) -> String {
        format!(
            "I am writing a message to my future self. Help me improve it while keeping my voice.\n\
             Draft:\n\"\"\"\n{}\n\"\"\"\n{}",
            req.draft.trim(),
            format_instructions(message::LABELS)
        )
    }
}
