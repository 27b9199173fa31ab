//! Once-a-day wisdom card.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cache::{daily_key, Namespace};
use crate::config::FeatureToggles;
use crate::error::Result;
use crate::utils::extract::{extract_section, or_default};

use super::{Feature, PromptBuilder};

pub const LABELS: &[&str] = &["WISDOM:", "REFLECTION:", "ACTION:"];

/// Offline rotation, picked by day of year.
const OFFLINE_WISDOM: &[(&str, &str, &str)] = &[
    (
        "Small steps taken daily become the long road you are proud of.",
        "Which small step did you take yesterday that you did not give yourself credit for?",
        "Pick one five-minute task and finish it before lunch.",
    ),
    (
        "Rest is not the opposite of progress; it is part of it.",
        "When did you last stop without feeling guilty about it?",
        "Take a ten-minute walk without your phone.",
    ),
    (
        "You do not have to feel ready to begin.",
        "What are you waiting to feel before you start?",
        "Write the first sentence of something you have been putting off.",
    ),
    (
        "Kindness to others often starts as patience with yourself.",
        "Where were you hard on yourself this week?",
        "Say one encouraging thing to yourself out loud today.",
    ),
    (
        "What you pay attention to grows.",
        "What has taken most of your attention lately, and is it what you want to grow?",
        "Note three good moments before bed tonight.",
    ),
    (
        "A quiet mind hears what a busy one misses.",
        "When today did you feel most settled?",
        "Spend two minutes breathing slowly before your next task.",
    ),
    (
        "Courage is often just the decision to try once more.",
        "What would you try again if you were sure no one was watching?",
        "Retry one thing that did not work the first time.",
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWisdom {
    pub wisdom: String,
    pub reflection: String,
    pub action: String,
}

#[derive(Debug, Clone)]
pub struct DailyWisdomRequest {
    pub date: NaiveDate,
}

impl DailyWisdomRequest {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    fn offline(&self) -> (&'static str, &'static str, &'static str) {
        OFFLINE_WISDOM[self.date.ordinal0() as usize % OFFLINE_WISDOM.len()]
    }
}

impl Feature for DailyWisdomRequest {
    type Output = DailyWisdom;
    const NAMESPACE: Namespace = Namespace::DailyWisdom;

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn cache_key(&self) -> String {
        daily_key(Self::NAMESPACE, self.date)
    }

    fn is_enabled(&self, toggles: &FeatureToggles) -> bool {
        toggles.daily_wisdom
    }

    fn prompt(&self, prompts: &dyn PromptBuilder) -> String {
        prompts.daily_wisdom(self)
    }

    fn parse(&self, text: &str) -> DailyWisdom {
        let (wisdom, reflection, action) = self.offline();
        DailyWisdom {
            wisdom: or_default(extract_section(text, "WISDOM:", LABELS), wisdom),
            reflection: or_default(extract_section(text, "REFLECTION:", LABELS), reflection),
            action: or_default(extract_section(text, "ACTION:", LABELS), action),
        }
    }

    fn fallback(&self) -> DailyWisdom {
        let (wisdom, reflection, action) = self.offline();
        DailyWisdom {
            wisdom: wisdom.to_string(),
            reflection: reflection.to_string(),
            action: action.to_string(),
        }
    }
}
