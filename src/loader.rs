//! Decode-with-fallback: try candidate encodings in order until one parses.
//!
//! The explicit choice (if any) goes first and does not short-circuit the
//! fallback chain when it fails. The chain itself is the sniffed guess
//! followed by the configured fallbacks, deduplicated. Every failure is kept
//! in the attempt log so an exhausted load can explain itself.

use serde::Serialize;

use crate::encoding::{decode, fallback_candidates, EncodingChoice};
use crate::error::{ConvertError, Result};
use crate::table::{parse_delimited, Table, TAB};

/// Which part of the pipeline proposed a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Explicit,
    Fallback,
}

/// A failed candidate and why it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub label: String,
    pub stage: Stage,
    pub error: String,
}

/// Ordered failures accumulated during one load.
pub type AttemptLog = Vec<Attempt>;

/// Successful load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    pub table: Table,
    /// Label that parsed.
    pub encoding: String,
    /// Whether the winner was the user's explicit choice.
    pub stage: Stage,
    /// Sniffer's guess for the bytes, if it had one.
    pub sniffed: Option<String>,
    /// Failures that preceded the winner.
    pub failures: AttemptLog,
}

/// The full, ordered list of `(stage, label)` pairs a load would try.
#[must_use]
pub fn attempt_order<S: AsRef<str>>(
    choice: &EncodingChoice,
    sniffed: Option<&str>,
    fallbacks: &[S],
) -> Vec<(Stage, String)> {
    let explicit = choice
        .explicit()
        .map(|label| (Stage::Explicit, label.to_string()));
    let chain = fallback_candidates(sniffed, fallbacks)
        .into_iter()
        .map(|label| (Stage::Fallback, label));
    explicit.into_iter().chain(chain).collect()
}

/// Decode `bytes` as `label` and parse the result as tab-delimited data.
///
/// # Errors
/// The decode or parse failure for this single candidate.
pub fn try_candidate(bytes: &[u8], label: &str) -> Result<Table> {
    let text = decode(bytes, label)?;
    parse_delimited(&text, TAB)
}

/// Run the fallback state machine over `bytes`.
///
/// # Errors
/// [`ConvertError::Exhausted`] with every attempt when no candidate parses.
pub fn load<S: AsRef<str>>(
    bytes: &[u8],
    choice: &EncodingChoice,
    sniffed: Option<&str>,
    fallbacks: &[S],
) -> Result<LoadOutcome> {
    let mut failures = AttemptLog::new();

    for (stage, label) in attempt_order(choice, sniffed, fallbacks) {
        match try_candidate(bytes, &label) {
            Ok(table) => {
                tracing::info!(
                    encoding = %label,
                    ?stage,
                    rows = table.row_count(),
                    columns = table.column_count(),
                    "loaded"
                );
                return Ok(LoadOutcome {
                    table,
                    encoding: label,
                    stage,
                    sniffed: sniffed.map(str::to_string),
                    failures,
                });
            }
            Err(e) => {
                let error = failure_detail(e);
                tracing::debug!(encoding = %label, ?stage, %error, "candidate failed");
                failures.push(Attempt {
                    label,
                    stage,
                    error,
                });
            }
        }
    }

    tracing::warn!(attempts = failures.len(), "no candidate encoding could read the file");
    Err(ConvertError::Exhausted { attempts: failures })
}

/// Error text shown next to the label in diagnostics.
fn failure_detail(e: ConvertError) -> String {
    match e {
        ConvertError::Decode { detail, .. } => detail,
        ConvertError::Parse(detail) => detail,
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::encoding::CANONICAL_FALLBACKS;

    fn utf16(text: &str) -> Vec<u8> {
        let mut out = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_auto_stops_at_first_success() {
        let outcome = load(b"id\tname\n1\tAda", &EncodingChoice::Auto, None, &CANONICAL_FALLBACKS)
            .unwrap();
        assert_eq!(outcome.encoding, "utf-8");
        assert_eq!(outcome.stage, Stage::Fallback);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.sniffed, None);
    }

    #[test]
    fn test_outcome_carries_sniffed_guess() {
        let outcome = load(
            b"a\n1",
            &EncodingChoice::Explicit("ascii".into()),
            Some("windows-1252"),
            &CANONICAL_FALLBACKS,
        )
        .unwrap();
        assert_eq!(outcome.encoding, "ascii");
        assert_eq!(outcome.sniffed.as_deref(), Some("windows-1252"));
    }

    #[test]
    fn test_explicit_success_skips_fallbacks() {
        let choice = EncodingChoice::Explicit("latin1".into());
        let outcome = load(b"a\n\xE9", &choice, Some("utf-8"), &CANONICAL_FALLBACKS).unwrap();
        assert_eq!(outcome.encoding, "latin1");
        assert_eq!(outcome.stage, Stage::Explicit);
        assert_eq!(outcome.table.rows[0][0].to_string(), "é");
    }

    #[test]
    fn test_explicit_failure_falls_back() {
        let bytes = utf16("id\tname\n1\tAda");
        let choice = EncodingChoice::Explicit("utf-8".into());
        let outcome = load(&bytes, &choice, None, &CANONICAL_FALLBACKS).unwrap();

        assert_eq!(outcome.encoding, "utf-16");
        assert_eq!(outcome.stage, Stage::Fallback);
        let tried: Vec<_> = outcome
            .failures
            .iter()
            .map(|a| (a.stage, a.label.as_str()))
            .collect();
        assert_eq!(
            tried,
            vec![
                (Stage::Explicit, "utf-8"),
                (Stage::Fallback, "utf-8"),
                (Stage::Fallback, "utf-8-sig"),
            ]
        );
    }

    #[test]
    fn test_exhausted_logs_every_attempt() {
        // Odd-length, invalid UTF-8, invalid GB18030 and Big5 lead byte at the end.
        let bytes = b"a\xFF\x81";
        let choice = EncodingChoice::Explicit("ascii".into());
        let err = load(bytes, &choice, None, &CANONICAL_FALLBACKS).unwrap_err();

        let attempts = err.attempts();
        assert_eq!(attempts.len(), 1 + CANONICAL_FALLBACKS.len());
        assert_eq!(attempts[0].label, "ascii");
        assert_eq!(attempts[0].stage, Stage::Explicit);
        for (attempt, expected) in attempts[1..].iter().zip(CANONICAL_FALLBACKS) {
            assert_eq!(attempt.label, expected);
            assert!(!attempt.error.is_empty());
        }
    }

    #[test]
    fn test_attempt_order_dedups_chain_only() {
        let order = attempt_order(
            &EncodingChoice::Explicit("utf-16".into()),
            Some("utf-16"),
            &CANONICAL_FALLBACKS,
        );
        let labels: Vec<_> = order.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec!["utf-16", "utf-16", "utf-8", "utf-8-sig", "gb18030", "big5"]
        );
        assert_eq!(order[0].0, Stage::Explicit);
        assert!(order[1..].iter().all(|(s, _)| *s == Stage::Fallback));
    }

    #[test]
    fn test_parse_failure_is_recorded() {
        let err = load(
            b"a\tb\n1\t2\t3",
            &EncodingChoice::Auto,
            None,
            &["utf-8"],
        )
        .unwrap_err();
        assert_eq!(
            err.attempts()[0].error,
            "Error tokenizing data. Expected 2 fields in line 2, saw 3"
        );
    }
}
