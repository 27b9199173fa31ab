//! Vocabulary usage context.

use serde::{Deserialize, Serialize};

use crate::cache::{content_key, Namespace};
use crate::config::FeatureToggles;
use crate::error::Result;
use crate::utils::extract::{extract_list, extract_section, or_default};

use super::{require_text, Feature, PromptBuilder};

pub const LABELS: &[&str] = &["EXAMPLES:", "USAGE TIP:", "MEMORY HOOK:"];

const DEFAULT_MEMORY_HOOK: &str =
    "Say the word out loud three times and picture where you would use it.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyContext {
    pub examples: Vec<String>,
    pub usage_tip: String,
    pub memory_hook: String,
}

#[derive(Debug, Clone)]
pub struct VocabularyContextRequest {
    pub word: String,
    pub definition: Option<String>,
}

impl VocabularyContextRequest {
    pub fn new(word: impl Into<String>, definition: Option<String>) -> Self {
        Self {
            word: word.into(),
            definition,
        }
    }

    fn default_example(&self) -> String {
        format!(
            "Try using \"{}\" in a sentence about your day.",
            self.word.trim()
        )
    }

    fn default_usage_tip(&self) -> String {
        match self.definition.as_deref().map(str::trim) {
            Some(def) if !def.is_empty() => format!("It means: {}.", def.trim_end_matches('.')),
            _ => "Notice where you read or hear this word this week.".to_string(),
        }
    }
}

impl Feature for VocabularyContextRequest {
    type Output = VocabularyContext;
    const NAMESPACE: Namespace = Namespace::VocabularyContext;

    fn validate(&self) -> Result<()> {
        require_text(&self.word, "word")
    }

    fn cache_key(&self) -> String {
        content_key(Self::NAMESPACE, &[self.word.trim().to_lowercase().as_str()])
    }

    fn is_enabled(&self, toggles: &FeatureToggles) -> bool {
        toggles.vocabulary_help
    }

    fn prompt(&self, prompts: &dyn PromptBuilder) -> String {
        prompts.vocabulary_context(self)
    }

    fn parse(&self, text: &str) -> VocabularyContext {
        let mut examples = extract_list(text, "EXAMPLES:", LABELS);
        if examples.is_empty() {
            examples = vec![self.default_example()];
        }
        VocabularyContext {
            examples,
            usage_tip: extract_section(text, "USAGE TIP:", LABELS)
                .unwrap_or_else(|| self.default_usage_tip()),
            memory_hook: or_default(
                extract_section(text, "MEMORY HOOK:", LABELS),
                DEFAULT_MEMORY_HOOK,
            ),
        }
    }

    fn fallback(&self) -> VocabularyContext {
        VocabularyContext {
            examples: vec![self.default_example()],
            usage_tip: self.default_usage_tip(),
            memory_hook: DEFAULT_MEMORY_HOOK.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_example_list() {
        let req = VocabularyContextRequest::new("candor", None);
        let text = "EXAMPLES:\n1. Her candor was refreshing.\n2. He answered with candor.\n\
                    USAGE TIP: Used for honest speech.\nMEMORY HOOK: Candor sounds like 'can do, or'.";
        let parsed = req.parse(text);
        assert_eq!(parsed.examples.len(), 2);
        assert_eq!(parsed.examples[0], "Her candor was refreshing.");
        assert_eq!(parsed.usage_tip, "Used for honest speech.");
    }

    #[test]
    fn test_key_ignores_case_and_whitespace() {
        let a = VocabularyContextRequest::new(" Candor ", None).cache_key();
        let b = VocabularyContextRequest::new("candor", Some("honesty".into())).cache_key();
        assert_eq!(a, b);
        assert!(a.starts_with("vocab_"));
    }

    #[test]
    fn test_fallback_uses_definition() {
        let fb = VocabularyContextRequest::new("candor", Some("frankness.".into())).fallback();
        assert_eq!(fb.usage_tip, "It means: frankness.");
        assert!(fb.examples[0].contains("\"candor\""));
    }
}
