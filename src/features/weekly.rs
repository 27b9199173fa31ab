//! Weekly journal pattern summary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cache::{composite_key, Namespace};
use crate::config::FeatureToggles;
use crate::error::{ProdyError, Result};
use crate::utils::extract::{extract_list, extract_section};

use super::{Feature, PromptBuilder};

pub const LABELS: &[&str] = &["SUMMARY:", "PATTERNS:", "ENCOURAGEMENT:"];

const DEFAULT_ENCOURAGEMENT: &str = "Showing up to write this week is something to be proud of.";
const DEFAULT_PATTERN: &str = "Consistent journaling";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPattern {
    pub summary: String,
    pub patterns: Vec<String>,
    pub encouragement: String,
}

#[derive(Debug, Clone)]
pub struct WeeklyPatternRequest {
    pub week_ending: NaiveDate,
    /// Entry texts or summaries, oldest first.
    pub entries: Vec<String>,
}

impl WeeklyPatternRequest {
    pub fn new(week_ending: NaiveDate, entries: Vec<String>) -> Self {
        Self {
            week_ending,
            entries,
        }
    }

    fn default_summary(&self) -> String {
        match self.entries.len() {
            1 => "You wrote 1 entry this week.".to_string(),
            n => format!("You wrote {} entries this week.", n),
        }
    }
}

impl Feature for WeeklyPatternRequest {
    type Output = WeeklyPattern;
    const NAMESPACE: Namespace = Namespace::WeeklyPattern;

    fn validate(&self) -> Result<()> {
        if self.entries.iter().all(|e| e.trim().is_empty()) {
            return Err(ProdyError::InvalidInput(
                "weekly pattern needs at least one non-empty entry".into(),
            ));
        }
        Ok(())
    }

    fn cache_key(&self) -> String {
        composite_key(Self::NAMESPACE, self.week_ending, self.entries.len())
    }

    fn is_enabled(&self, toggles: &FeatureToggles) -> bool {
        toggles.weekly_patterns
    }

    fn prompt(&self, prompts: &dyn PromptBuilder) -> String {
        prompts.weekly_pattern(self)
    }

    fn parse(&self, text: &str) -> WeeklyPattern {
        let mut patterns = extract_list(text, "PATTERNS:", LABELS);
        if patterns.is_empty() {
            patterns = vec![DEFAULT_PATTERN.to_string()];
        }
        WeeklyPattern {
            summary: extract_section(text, "SUMMARY:", LABELS)
                .unwrap_or_else(|| self.default_summary()),
            patterns,
            encouragement: extract_section(text, "ENCOURAGEMENT:", LABELS)
                .unwrap_or_else(|| DEFAULT_ENCOURAGEMENT.to_string()),
        }
    }

    fn fallback(&self) -> WeeklyPattern {
        WeeklyPattern {
            summary: self.default_summary(),
            patterns: vec![DEFAULT_PATTERN.to_string()],
            encouragement: DEFAULT_ENCOURAGEMENT.to_string(),
        }
    }
}
