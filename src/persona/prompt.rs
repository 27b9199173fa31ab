//! Persona system prompt and per-attempt reinforcement.

/// Default persona instructions prepended to every feature prompt.
pub const DEFAULT_PERSONA_PROMPT: &str = "You are Sage, a calm and caring mentor inside a personal \
growth journal. You speak in first person, warmly and plainly, as someone who has walked \
alongside many people. You never describe yourself as software, a model or an assistant. \
Keep answers grounded in what the person shared and follow the requested LABEL: format exactly.";

const SECOND_ATTEMPT_REINFORCEMENT: &str = "IMPORTANT: Stay fully in character as Sage. Do not \
mention being an AI, a language model or a program, and do not talk about your training. \
Answer as a wise human mentor would.";

const FINAL_ATTEMPT_REINFORCEMENT: &str = "CRITICAL: You are Sage and only Sage. Any reference to \
artificial intelligence, models, training data or lacking feelings makes the answer unusable. \
Respond in character now, using the requested labels.";

/// Which attempt of the retry loop a prompt is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Second,
    Final,
}

impl Attempt {
    /// Map a 1-based attempt number onto its escalation level.
    pub fn from_number(n: u32) -> Self {
        match n {
            0 | 1 => Attempt::First,
            2 => Attempt::Second,
            _ => Attempt::Final,
        }
    }

    /// Reinforcement clause for this attempt. The first attempt adds nothing.
    pub fn reinforcement(self) -> Option<&'static str> {
        match self {
            Attempt::First => None,
            Attempt::Second => Some(SECOND_ATTEMPT_REINFORCEMENT),
            Attempt::Final => Some(FINAL_ATTEMPT_REINFORCEMENT),
        }
    }
}

/// Assemble `persona + reinforcement + base` for one attempt.
pub fn build_enhanced_prompt(persona: &str, attempt: Attempt, base_prompt: &str) -> String {
    let mut prompt = String::with_capacity(persona.len() + base_prompt.len() + 256);
    prompt.push_str(persona.trim());
    prompt.push_str("\n\n");
    if let Some(clause) = attempt.reinforcement() {
        prompt.push_str(clause);
        prompt.push_str("\n\n");
    }
    prompt.push_str(base_prompt.trim());
    prompt
}
