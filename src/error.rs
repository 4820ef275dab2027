//! Structured error types for xlconvert.
//!
//! Every failure is caught at the boundary of the operation that produced it
//! and surfaced as one of these variants; none of them abort the process.

use crate::loader::Attempt;

/// All errors that can occur while loading, slicing and exporting a table.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A single candidate failed to decode or parse. Recovered locally by the
    /// loader; only seen directly by callers of the per-candidate functions.
    #[error("{label}: {detail}")]
    Decode { label: String, detail: String },

    /// Decoded text is not a well-formed table.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Every candidate failed. Carries the full attempt log in attempt order.
    #[error("Could not read the file with the attempted encodings ({} tried)", attempts.len())]
    Exhausted { attempts: Vec<Attempt> },

    /// Start row is after end row.
    #[error("Start row must be ≤ End row (got {start} > {end})")]
    InvalidRange { start: u64, end: u64 },

    /// A row index outside `[1, row_count]`.
    #[error("Row range {start}..={end} is outside 1..={row_count}")]
    RangeOutOfBounds { start: u64, end: u64, row_count: u64 },

    /// Worksheet name rejected by the spreadsheet format.
    #[error("Invalid sheet name: {0}")]
    SheetName(String),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Delimited-text reader error.
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error, e.g. a malformed options file.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Build a per-candidate failure.
    pub fn decode(label: &str, detail: impl Into<String>) -> Self {
        Self::Decode {
            label: label.to_string(),
            detail: detail.into(),
        }
    }

    /// Attempt log carried by an exhausted load, empty for every other variant.
    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Self::Exhausted { attempts } => attempts,
            _ => &[],
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<ConvertError> for wasm_bindgen::JsValue {
    fn from(e: ConvertError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
