//! Future-message writing helper.

use serde::{Deserialize, Serialize};

use crate::cache::{content_key, Namespace};
use crate::config::FeatureToggles;
use crate::error::Result;
use crate::utils::extract::{extract_section, or_default};

use super::{require_text, Feature, PromptBuilder};

pub const LABELS: &[&str] = &["IMPROVED:", "TONE:", "TIP:"];

const DEFAULT_TONE: &str = "Honest";
const DEFAULT_TIP: &str =
    "Add one detail about today that your future self might have forgotten.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHelp {
    pub improved_message: String,
    pub tone: String,
    pub tip: String,
}

#[derive(Debug, Clone)]
pub struct MessageHelpRequest {
    pub draft: String,
}

impl MessageHelpRequest {
    pub fn new(draft: impl Into<String>) -> Self {
        Self {
            draft: draft.into(),
        }
    }
}

impl Feature for MessageHelpRequest {
    type Output = MessageHelp;
    const NAMESPACE: Namespace = Namespace::MessageHelper;

    fn validate(&self) -> Result<()> {
        require_text(&self.draft, "message draft")
    }

    fn cache_key(&self) -> String {
        content_key(Self::NAMESPACE, &[self.draft.trim()])
    }

    fn is_enabled(&self, toggles: &FeatureToggles) -> bool {
        toggles.message_helper
    }

    fn prompt(&self, prompts: &dyn PromptBuilder) -> String {
        prompts.message_help(self)
    }

    fn parse(&self, text: &str) -> MessageHelp {
        MessageHelp {
            improved_message: extract_section(text, "IMPROVED:", LABELS)
                .unwrap_or_else(|| self.draft.trim().to_string()),
            tone: or_default(extract_section(text, "TONE:", LABELS), DEFAULT_TONE),
            tip: or_default(extract_section(text, "TIP:", LABELS), DEFAULT_TIP),
        }
    }

    /// The draft comes back untouched.
    fn fallback(&self) -> MessageHelp {
        MessageHelp {
            improved_message: self.draft.trim().to_string(),
            tone: DEFAULT_TONE.to_string(),
            tip: DEFAULT_TIP.to_string(),
        }
    }
}
