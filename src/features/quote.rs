//! Quote explanation.

use serde::{Deserialize, Serialize};

use crate::cache::{content_key, Namespace};
use crate::config::FeatureToggles;
use crate::error::Result;
use crate::utils::extract::{extract_section, or_default};

use super::{require_text, Feature, PromptBuilder};

pub const LABELS: &[&str] = &["MEANING:", "APPLICATION:", "TRY TODAY:"];

const DEFAULT_MEANING: &str =
    "Sit with these words for a moment and notice which part speaks to you.";
const DEFAULT_APPLICATION: &str =
    "Think of one situation this week where this idea would have helped.";
const DEFAULT_TRY_TODAY: &str = "Write the quote somewhere you will see it tonight.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteExplanation {
    pub meaning: String,
    pub application: String,
    pub try_today: String,
}

#[derive(Debug, Clone)]
pub struct QuoteExplanationRequest {
    pub quote: String,
    pub author: Option<String>,
}

impl QuoteExplanationRequest {
    pub fn new(quote: impl Into<String>, author: Option<String>) -> Self {
        Self {
            quote: quote.into(),
            author,
        }
    }
}

impl Feature for QuoteExplanationRequest {
    type Output = QuoteExplanation;
    const NAMESPACE: Namespace = Namespace::QuoteExplanation;

    fn validate(&self) -> Result<()> {
        require_text(&self.quote, "quote")
    }

    fn cache_key(&self) -> String {
        content_key(
            Self::NAMESPACE,
            &[self.quote.trim(), self.author.as_deref().unwrap_or("").trim()],
        )
    }

    fn is_enabled(&self, toggles: &FeatureToggles) -> bool {
        toggles.quote_explanations
    }

    fn prompt(&self, prompts: &dyn PromptBuilder) -> String {
        prompts.quote_explanation(self)
    }

    fn parse(&self, text: &str) -> QuoteExplanation {
        QuoteExplanation {
            meaning: or_default(extract_section(text, "MEANING:", LABELS), DEFAULT_MEANING),
            application: or_default(
                extract_section(text, "APPLICATION:", LABELS),
                DEFAULT_APPLICATION,
            ),
            try_today: or_default(
                extract_section(text, "TRY TODAY:", LABELS),
                DEFAULT_TRY_TODAY,
            ),
        }
    }

    fn fallback(&self) -> QuoteExplanation {
        QuoteExplanation {
            meaning: DEFAULT_MEANING.to_string(),
            application: DEFAULT_APPLICATION.to_string(),
            try_today: DEFAULT_TRY_TODAY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stops_at_next_label() {
        let req = QuoteExplanationRequest::new("Be kind.", None);
        let parsed = req.parse("MEANING: Be kind.\nTRY TODAY: smile");
        assert_eq!(parsed.meaning, "Be kind.");
        assert_eq!(parsed.try_today, "smile");
        assert_eq!(parsed.application, DEFAULT_APPLICATION);
    }

    #[test]
    fn test_key_includes_author() {
        let a = QuoteExplanationRequest::new("Know thyself.", Some("Socrates".into()));
        let b = QuoteExplanationRequest::new("Know thyself.", None);
        assert_ne!(a.cache_key(), b.cache_key());
        assert!(a.cache_key().starts_with("quote_"));
    }

    #[test]
    fn test_blank_quote_is_invalid() {
        assert!(QuoteExplanationRequest::new("", None).validate().is_err());
    }
}
