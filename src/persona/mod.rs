//! Companion persona: prompt framing and disclosure validation.

pub mod prompt;
pub mod validator;

pub use prompt::{build_enhanced_prompt, Attempt, DEFAULT_PERSONA_PROMPT};
pub use validator::{PersonaValidator, GENERIC_PHRASES, MIN_SALVAGEABLE_CHARS};
