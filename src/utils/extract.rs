//! "LABEL: value" extraction from free-form provider text.
//!
//! Providers are asked to answer in a loose labelled format such as
//!
//! ```text
//! MEANING: Be kind.
//! TRY TODAY: smile at a stranger
//! ```
//!
//! Each feature owns a [`LabelSet`] describing its vocabulary. A section runs
//! from the end of its label up to the nearest occurrence of *any* label in the
//! set, or to the end of the text.

/// The label vocabulary of one feature.
#[derive(Debug, Clone)]
pub struct LabelSet {
    labels: Vec<&'static str>,
}

impl LabelSet {
    pub fn new(labels: &[&'static str]) -> Self {
        Self {
            labels: labels.to_vec(),
        }
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    /// Extract the section following `label`. See [`extract_section`].
    pub fn section(&self, text: &str, label: &str) -> Option<String> {
        extract_section(text, label, &self.labels)
    }

    /// Extract the section following `label` as a list. See [`extract_list`].
    pub fn list(&self, text: &str, label: &str) -> Vec<String> {
        extract_list(text, label, &self.labels)
    }

    /// Whether any label of this set occurs in `text`.
    pub fn matches_any(&self, text: &str) -> bool {
        let lowered = text.to_ascii_lowercase();
        self.labels
            .iter()
            .any(|l| find_label(&lowered, &l.to_ascii_lowercase()).is_some())
    }
}

/// Locate `label` case-insensitively and capture the text after it.
///
/// The capture stops at the nearest occurrence of any label in `labels`
/// (including `label` itself, so a repeated label ends the first section), or
/// at the end of `text`. The first occurrence of `label` wins. Returns `None`
/// when the label is absent or the captured section is blank.
pub fn extract_section(text: &str, label: &str, labels: &[&str]) -> Option<String> {
    // ASCII lowering keeps byte offsets aligned with the original text.
    let lowered = text.to_ascii_lowercase();
    let needle = label.to_ascii_lowercase();
    if needle.is_empty() {
        return None;
    }

    let start = find_label(&lowered, &needle)? + needle.len();
    let rest = &lowered[start..];

    let end = labels
        .iter()
        .map(|l| l.to_ascii_lowercase())
        .filter(|l| !l.is_empty())
        .filter_map(|l| find_label(rest, &l))
        .min()
        .map(|offset| start + offset)
        .unwrap_or(text.len());

    let section = text[start..end].trim();
    if section.is_empty() {
        None
    } else {
        Some(section.to_string())
    }
}

/// Byte offset of the first `needle` that starts a word, so `TONE:` never
/// matches inside `milestone:`.
fn find_label(haystack: &str, needle: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    haystack
        .match_indices(needle)
        .map(|(i, _)| i)
        .find(|&i| i == 0 || !bytes[i - 1].is_ascii_alphanumeric())
}

/// Extract a section and split it into list items.
///
/// Items are separated by newlines, or by commas when the section is a single
/// line. Bullet markers (`-`, `*`, `•`) and `1.` / `1)` numbering are stripped.
pub fn extract_list(text: &str, label: &str, labels: &[&str]) -> Vec<String> {
    let Some(section) = extract_section(text, label, labels) else {
        return Vec::new();
    };

    let raw: Vec<&str> = if section.contains('\n') {
        section.lines().collect()
    } else {
        section.split(',').collect()
    };

    raw.into_iter()
        .map(strip_list_marker)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Return `value` or the feature's literal default when extraction came up empty.
pub fn or_default(value: Option<String>, default: &str) -> String {
    value.unwrap_or_else(|| default.to_string())
}

fn strip_list_marker(item: &str) -> &str {
    let item = item.trim();
    let item = item
        .strip_prefix('-')
        .or_else(|| item.strip_prefix('*'))
        .or_else(|| item.strip_prefix('•'))
        .unwrap_or(item)
        .trim_start();

    // "1." / "12)" numbering
    let digits = item.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let after = &item[digits..];
        if let Some(stripped) = after.strip_prefix('.').or_else(|| after.strip_prefix(')')) {
            return stripped.trim();
        }
    }
    item.trim()
}
