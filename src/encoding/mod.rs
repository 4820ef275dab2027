//! Encoding labels, the user's encoding choice and the fallback candidate list.

mod decode;
mod sniff;

pub use decode::decode;
pub use sniff::sniff;

use serde::{Deserialize, Serialize};

/// Label shown in the selector for the automatic path.
pub const AUTO_DETECT: &str = "Auto-detect";

/// Options offered by the encoding selector, in display order.
pub const SELECTOR_OPTIONS: [&str; 8] = [
    AUTO_DETECT,
    "utf-8",
    "utf-8-sig",
    "utf-16",
    "gb18030",
    "big5",
    "windows-1252",
    "latin1",
];

/// Encodings tried after the sniffed guess, widest first.
pub const CANONICAL_FALLBACKS: [&str; 5] = ["utf-8", "utf-8-sig", "utf-16", "gb18030", "big5"];

/// What the user picked in the encoding selector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "label", rename_all = "lowercase")]
pub enum EncodingChoice {
    /// Sniff + fallback only.
    #[default]
    Auto,
    /// Try this label first, then fall back.
    Explicit(String),
}

impl EncodingChoice {
    /// Parse a selector value. `auto`, `auto-detect` (any case) and blank map to
    /// [`EncodingChoice::Auto`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Self::Auto;
        }
        match normalize_label(trimmed).as_str() {
            "auto" | "auto-detect" => Self::Auto,
            _ => Self::Explicit(trimmed.to_string()),
        }
    }

    /// The explicit label, if any.
    #[must_use]
    pub fn explicit(&self) -> Option<&str> {
        match self {
            Self::Auto => None,
            Self::Explicit(label) => Some(label),
        }
    }
}

impl std::fmt::Display for EncodingChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => f.write_str(AUTO_DETECT),
            Self::Explicit(label) => f.write_str(label),
        }
    }
}

/// Canonical comparison form of a label: trimmed, lowercase, `_` → `-`.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label.trim().to_ascii_lowercase().replace('_', "-")
}

/// Build the ordered fallback list: sniffed guess first, then `fallbacks`.
///
/// Duplicates (compared by [`normalize_label`]) keep their first occurrence.
#[must_use]
pub fn fallback_candidates<S: AsRef<str>>(sniffed: Option<&str>, fallbacks: &[S]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(fallbacks.len() + 1);
    let mut out = Vec::with_capacity(fallbacks.len() + 1);

    for label in sniffed.into_iter().chain(fallbacks.iter().map(AsRef::<str>::as_ref)) {
        let key = normalize_label(label);
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(label.trim().to_string());
    }

    out
}
