//! Journal entry insight.

use serde::{Deserialize, Serialize};

use crate::cache::{content_key, Namespace};
use crate::config::FeatureToggles;
use crate::error::Result;
use crate::utils::extract::{extract_list, extract_section, or_default, LabelSet};

use super::{require_text, Feature, PromptBuilder};

pub const LABELS: &[&str] = &["EMOTION:", "THEMES:", "INSIGHT:", "SUGGESTION:"];

const DEFAULT_EMOTION: &str = "Reflective";
const DEFAULT_THEME: &str = "Self-reflection";
const DEFAULT_INSIGHT: &str =
    "Putting your thoughts into words is already an act of care for yourself.";
const DEFAULT_SUGGESTION: &str =
    "Come back to this entry tomorrow and notice what feels different.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalInsight {
    pub emotion: String,
    pub themes: Vec<String>,
    pub insight: String,
    pub suggestion: String,
}

#[derive(Debug, Clone)]
pub struct JournalInsightRequest {
    pub content: String,
    pub mood: Option<String>,
}

impl JournalInsightRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mood: None,
        }
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }
}

impl Feature for JournalInsightRequest {
    type Output = JournalInsight;
    const NAMESPACE: Namespace = Namespace::JournalInsight;

    fn validate(&self) -> Result<()> {
        require_text(&self.content, "journal content")
    }

    fn cache_key(&self) -> String {
        content_key(Self::NAMESPACE, &[self.content.trim()])
    }

    fn is_enabled(&self, toggles: &FeatureToggles) -> bool {
        toggles.journal_insights
    }

    fn prompt(&self, prompts: &dyn PromptBuilder) -> String {
        prompts.journal_insight(self)
    }

    fn parse(&self, text: &str) -> JournalInsight {
        // Unlabelled prose is still a usable insight.
        if !LabelSet::new(LABELS).matches_any(text) && !text.trim().is_empty() {
            return JournalInsight {
                insight: text.trim().to_string(),
                ..self.fallback()
            };
        }

        let mut themes = extract_list(text, "THEMES:", LABELS);
        if themes.is_empty() {
            themes = vec![DEFAULT_THEME.to_string()];
        }
        JournalInsight {
            emotion: or_default(extract_section(text, "EMOTION:", LABELS), DEFAULT_EMOTION),
            themes,
            insight: or_default(extract_section(text, "INSIGHT:", LABELS), DEFAULT_INSIGHT),
            suggestion: or_default(
                extract_section(text, "SUGGESTION:", LABELS),
                DEFAULT_SUGGESTION,
            ),
        }
    }

    fn fallback(&self) -> JournalInsight {
        JournalInsight {
            emotion: self
                .mood
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_EMOTION)
                .to_string(),
            themes: vec![DEFAULT_THEME.to_string()],
            insight: DEFAULT_INSIGHT.to_string(),
            suggestion: DEFAULT_SUGGESTION.to_string(),
        }
    }
}
