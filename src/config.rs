//! Tunables for a conversion, with defaults matching the stock behavior.
//!
//! Options deserialize from JSON with every field optional, so a config file
//! only needs to mention what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::encoding::CANONICAL_FALLBACKS;
use crate::error::Result;
use crate::export::{validate_sheet_name, DEFAULT_FILE_NAME, DEFAULT_SHEET_NAME};

/// Rows shown by a preview unless configured otherwise.
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertOptions {
    /// Encodings tried after the sniffed guess.
    pub fallback_encodings: Vec<String>,
    /// Worksheet receiving the selection.
    pub sheet_name: String,
    /// Used when the requested file name is blank.
    pub default_file_name: String,
    /// Rows returned by [`crate::session::LoadedTable::preview`].
    pub preview_rows: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            fallback_encodings: CANONICAL_FALLBACKS.iter().map(|s| (*s).to_string()).collect(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            default_file_name: DEFAULT_FILE_NAME.to_string(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl ConvertOptions {
    /// Parse options from a JSON document.
    ///
    /// # Errors
    /// Malformed JSON, unknown fields or an invalid sheet name.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        validate_sheet_name(&options.sheet_name)?;
        Ok(options)
    }

    /// Read and parse a JSON options file.
    ///
    /// # Errors
    /// I/O failure or anything [`ConvertOptions::from_json`] rejects.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded options");
        Self::from_json(&json)
    }
}
