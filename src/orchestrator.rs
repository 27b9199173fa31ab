//! Retry-with-escalating-prompt generation across two providers.
//!
//! Each round asks the primary provider first and the secondary second. A
//! response that stays in persona ends the loop immediately; an off-persona
//! response is remembered and the next round repeats with a stronger
//! reinforcement clause. When every round is exhausted the last response is
//! sanitized as a salvage attempt.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::persona::{build_enhanced_prompt, Attempt, PersonaValidator, DEFAULT_PERSONA_PROMPT};
use crate::providers::{call_provider, ProviderClient, ProviderResult, ProviderSlot};

/// Default number of rounds.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Text produced by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Slot of the provider that produced `text`.
    pub provider: ProviderSlot,
    /// `ProviderClient::name()` of that provider.
    pub provider_name: String,
    /// Rounds started before `text` was accepted.
    pub attempts: u32,
    /// Whether `text` is a sanitized salvage of an off-persona response.
    pub sanitized: bool,
}

pub struct FallbackOrchestrator {
    primary: Arc<dyn ProviderClient>,
    secondary: Arc<dyn ProviderClient>,
    validator: PersonaValidator,
    persona_prompt: String,
    max_retries: u32,
}

impl FallbackOrchestrator {
    pub fn new(primary: Arc<dyn ProviderClient>, secondary: Arc<dyn ProviderClient>) -> Self {
        Self {
            primary,
            secondary,
            validator: PersonaValidator::new(),
            persona_prompt: DEFAULT_PERSONA_PROMPT.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_persona_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.persona_prompt = prompt.into();
        self
    }

    /// Set the default round count. Clamped to at least 1.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_validator(mut self, validator: PersonaValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn primary(&self) -> &dyn ProviderClient {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> &dyn ProviderClient {
        self.secondary.as_ref()
    }

    /// Whether at least one provider could be called.
    pub fn any_configured(&self) -> bool {
        self.primary.is_configured() || self.secondary.is_configured()
    }

    pub async fn generate(&self, base_prompt: &str) -> Option<Generation> {
        self.generate_with_retries(base_prompt, self.max_retries)
            .await
    }

    /// Run up to `max_retries` rounds. Returns `None` when no usable text
    /// was produced; provider errors never escape.
    pub async fn generate_with_retries(
        &self,
        base_prompt: &str,
        max_retries: u32,
    ) -> Option<Generation> {
        let mut last_response: Option<(String, ProviderSlot, String)> = None;
        let rounds = max_retries.max(1);

        for round in 1..=rounds {
            let prompt =
                build_enhanced_prompt(&self.persona_prompt, Attempt::from_number(round), base_prompt);

            for (slot, client) in [
                (ProviderSlot::Primary, &self.primary),
                (ProviderSlot::Secondary, &self.secondary),
            ] {
                match call_provider(client.as_ref(), &prompt).await {
                    ProviderResult::Success(text) if !text.trim().is_empty() => {
                        if !self.validator.is_generic(&text) {
                            debug!(provider = %client.name(), slot = %slot, round, "Accepted response");
                            return Some(Generation {
                                text,
                                provider: slot,
                                provider_name: client.name().to_string(),
                                attempts: round,
                                sanitized: false,
                            });
                        }
                        info!(provider = %client.name(), round, "Response broke persona, retrying");
                        last_response = Some((text, slot, client.name().to_string()));
                    }
                    ProviderResult::Success(_) => {
                        warn!(provider = %client.name(), round, "Provider returned empty text");
                    }
                    ProviderResult::Failure(e) => {
                        warn!(provider = %client.name(), round, error = %e, "Provider call failed");
                    }
                    ProviderResult::NotConfigured => {}
                }
            }
        }

        let (text, slot, name) = last_response?;
        let cleaned = self.validator.sanitize(&text);
        if cleaned.trim().is_empty() {
            warn!(provider = %name, "Off-persona response could not be salvaged");
            return None;
        }
        debug!(provider = %name, "Using sanitized off-persona response");
        Some(Generation {
            text: cleaned,
            provider: slot,
            provider_name: name,
            attempts: rounds,
            sanitized: true,
        })
    }
}
