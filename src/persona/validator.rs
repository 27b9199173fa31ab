//! Persona disclosure detection and removal.
//!
//! Generated text must read as if written by the companion persona. Responses
//! that announce they come from an AI or a language model are flagged by
//! [`PersonaValidator::is_generic`] and either retried by the orchestrator or,
//! as a last resort, cleaned up by [`PersonaValidator::sanitize`].

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use regex::Regex;

/// Sanitized text at or below this many characters is unsalvageable.
pub const MIN_SALVAGEABLE_CHARS: usize = 50;

/// Phrases that signal the generator broke character. Matched ASCII
/// case-insensitively after apostrophe normalization.
pub const GENERIC_PHRASES: &[&str] = &[
    "as an ai",
    "as an a.i.",
    "i'm an ai",
    "i am an ai",
    "i'm just an ai",
    "i am just an ai",
    "as a language model",
    "as an ai language model",
    "large language model",
    "i'm a language model",
    "i am a language model",
    "artificial intelligence",
    "i don't have personal",
    "i do not have personal",
    "i don't have feelings",
    "i don't have emotions",
    "i cannot experience",
    "i'm a chatbot",
    "i am a chatbot",
    "as a virtual assistant",
    "trained by google",
    "trained by openai",
    "my training data",
];

static GENERIC_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(GENERIC_PHRASES)
        .unwrap()
});

/// Ordered removal rules. Softening clauses go first so the main clause that
/// follows them survives.
static REMOVALS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bwhile i (?:don't|do not) have (?:personal )?(?:feelings|emotions|experiences)[^,.!?\n]*,\s*",
        r"(?i)\bas an? (?:ai|a\.i\.|artificial intelligence)(?: language model)?,?\s*",
        r"(?i)\bas a (?:large )?language model,?\s*",
        r"(?i)\bas a virtual assistant,?\s*",
        r"(?i)\bi(?:'m| am) (?:just |only )?(?:an? )?(?:ai|a\.i\.|artificial intelligence|(?:large )?language model|chatbot|virtual assistant)\b[^.!?\n]*[.!?]?\s*",
        r"(?i)\bi (?:don't|do not|cannot|can't) (?:have|experience|feel) (?:personal |real |human )?(?:feelings|emotions|experiences|opinions|beliefs)\b[^.!?\n]*[.!?]?\s*",
        r"(?i)\b(?:i was |i've been |i have been )?trained by (?:google|openai|anthropic|meta)\b[^.!?\n]*[.!?]?\s*",
        r"(?i)\bmy training data\b[^.!?\n]*[.!?]?\s*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+([,.!?;:])").unwrap());
static REPEATED_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",(?:\s*,)+").unwrap());
static LEADING_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s,.;:!?\-]+").unwrap());
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());

/// Detects and strips persona-breaking disclosures.
#[derive(Debug, Clone)]
pub struct PersonaValidator {
    min_salvageable_chars: usize,
}

impl Default for PersonaValidator {
    fn default() -> Self {
        Self {
            min_salvageable_chars: MIN_SALVAGEABLE_CHARS,
        }
    }
}

impl PersonaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `text` contains any known disclosure phrase.
    pub fn is_generic(&self, text: &str) -> bool {
        GENERIC_MATCHER.is_match(&normalize_apostrophes(text))
    }

    /// Remove disclosure phrases and tidy the remaining text.
    ///
    /// Returns an empty string when what is left is too short to be useful.
    pub fn sanitize(&self, text: &str) -> String {
        let mut out = normalize_apostrophes(text);
        for re in REMOVALS.iter() {
            out = re.replace_all(&out, "").into_owned();
        }

        out = MULTI_SPACE_RE.replace_all(&out, " ").into_owned();
        out = SPACE_BEFORE_PUNCT_RE.replace_all(&out, "$1").into_owned();
        out = REPEATED_COMMA_RE.replace_all(&out, ",").into_owned();
        out = BLANK_LINES_RE.replace_all(&out, "\n\n").into_owned();
        out = LEADING_PUNCT_RE.replace(&out, "").into_owned();
        let out = capitalize_first(out.trim());

        if out.chars().count() <= self.min_salvageable_chars {
            String::new()
        } else {
            out
        }
    }
}

fn normalize_apostrophes(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'")
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        Some(_) => text.to_string(),
        None => String::new(),
    }
}
