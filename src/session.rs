//! Per-request pipeline context: upload → sniff → load → select → export.
//!
//! A [`Session`] owns the uploaded bytes for one request. Nothing is shared
//! between sessions and nothing outlives them.

use serde::Serialize;

use crate::config::ConvertOptions;
use crate::encoding::{sniff, EncodingChoice};
use crate::error::{ConvertError, Result};
use crate::export::{export, Download};
use crate::loader::{self, Attempt, LoadOutcome, Stage};
use crate::range::{RangeInput, RowRange};
use crate::table::{Row, Table};

/// Shown in place of the sniffed encoding when detection was inconclusive.
pub const UNKNOWN_ENCODING: &str = "unknown";

/// One upload and everything derived from it.
#[derive(Debug, Clone)]
pub struct Session {
    bytes: Vec<u8>,
    sniffed: Option<String>,
    options: ConvertOptions,
}

impl Session {
    /// Take ownership of the uploaded bytes and sniff their encoding.
    #[must_use]
    pub fn new(bytes: Vec<u8>, options: ConvertOptions) -> Self {
        let sniffed = sniff(&bytes);
        tracing::info!(
            bytes = bytes.len(),
            detected = sniffed.as_deref().unwrap_or(UNKNOWN_ENCODING),
            "upload received"
        );
        Self {
            bytes,
            sniffed,
            options,
        }
    }

    /// Best-guess encoding, if detection was conclusive.
    #[must_use]
    pub fn sniffed(&self) -> Option<&str> {
        self.sniffed.as_deref()
    }

    /// Detected encoding for display.
    #[must_use]
    pub fn sniffed_display(&self) -> &str {
        self.sniffed().unwrap_or(UNKNOWN_ENCODING)
    }

    #[must_use]
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Load under `choice` and gather everything a preview screen shows,
    /// whether the load succeeded or not.
    #[must_use]
    pub fn inspect(&self, choice: &EncodingChoice) -> Inspection {
        let mut inspection = Inspection {
            detected: self.sniffed_display().to_string(),
            summary: None,
            columns: Vec::new(),
            preview: Vec::new(),
            failures: Vec::new(),
            diagnostics: None,
        };
        match self.load(choice) {
            Ok(loaded) => {
                inspection.summary = Some(loaded.summary());
                inspection.columns = loaded.table().columns.clone();
                inspection.preview = loaded.preview().to_vec();
                inspection.failures = loaded.failures().to_vec();
            }
            Err(e) => {
                inspection.failures = e.attempts().to_vec();
                inspection.diagnostics = Some(Diagnostics::from_error(&e));
            }
        }
        inspection
    }

    /// Decode and parse under `choice`, falling back as needed.
    ///
    /// # Errors
    /// [`crate::ConvertError::Exhausted`] with the attempt log when nothing parses.
    pub fn load(&self, choice: &EncodingChoice) -> Result<LoadedTable> {
        let outcome = loader::load(
            &self.bytes,
            choice,
            self.sniffed(),
            &self.options.fallback_encodings,
        )?;
        Ok(LoadedTable {
            outcome,
            options: self.options.clone(),
        })
    }
}

/// Row/column counts and the encoding that won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: usize,
    pub encoding: String,
    pub detected: Option<String>,
}

impl std::fmt::Display for TableSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rows: {} | Columns: {}",
            group_thousands(self.rows),
            group_thousands(self.columns)
        )
    }
}

/// A successfully loaded table plus what it took to load it.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    outcome: LoadOutcome,
    options: ConvertOptions,
}

impl LoadedTable {
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.outcome.table
    }

    /// Label the table was decoded with.
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.outcome.encoding
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.outcome.stage
    }

    /// Candidates that failed before the winner.
    #[must_use]
    pub fn failures(&self) -> &[Attempt] {
        &self.outcome.failures
    }

    #[must_use]
    pub fn summary(&self) -> TableSummary {
        TableSummary {
            rows: self.table().row_count(),
            columns: self.table().column_count(),
            encoding: self.outcome.encoding.clone(),
            detected: self.outcome.sniffed.clone(),
        }
    }

    /// First configured number of rows.
    #[must_use]
    pub fn preview(&self) -> &[Row] {
        self.table().preview(self.options.preview_rows)
    }

    /// Default range inputs: the whole table.
    ///
    /// # Errors
    /// When the table has no data rows.
    pub fn default_range(&self) -> Result<RowRange> {
        RowRange::full(self.table().row_count())
    }

    /// Validate `input`, slice and export under `requested` file name.
    ///
    /// # Errors
    /// [`crate::ConvertError::InvalidRange`] before anything is written, or an
    /// export failure.
    pub fn export(&self, input: RangeInput, requested: &str) -> Result<Download> {
        let range = RowRange::from_inputs(input, self.table().row_count())?;
        let slice = self.table().select(range)?;
        let download = export(
            &slice,
            &self.options.sheet_name,
            requested,
            &self.options.default_file_name,
        )?;
        tracing::info!(
            %range,
            file = %download.file_name,
            bytes = download.bytes.len(),
            "exported selection"
        );
        Ok(download)
    }
}

/// Everything shown after an upload: detection result, table summary and
/// preview on success, the diagnostics panel on failure.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub detected: String,
    pub summary: Option<TableSummary>,
    pub columns: Vec<String>,
    pub preview: Vec<Row>,
    pub failures: Vec<Attempt>,
    pub diagnostics: Option<Diagnostics>,
}

/// Lines of the diagnostics panel shown after a failed load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub headline: String,
    pub lines: Vec<String>,
}

impl Diagnostics {
    pub const HEADLINE: &'static str = "Could not read the file with the attempted encodings.";

    #[must_use]
    pub fn from_attempts(attempts: &[Attempt]) -> Self {
        Self {
            headline: Self::HEADLINE.to_string(),
            lines: attempts
                .iter()
                .map(|a| format!("{} → {}", a.label, a.error))
                .collect(),
        }
    }

    /// Panel for any load error; only exhaustion carries per-attempt lines.
    #[must_use]
    pub fn from_error(e: &ConvertError) -> Self {
        match e {
            ConvertError::Exhausted { attempts } => Self::from_attempts(attempts),
            other => Self {
                headline: other.to_string(),
                lines: Vec::new(),
            },
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.headline)?;
        for line in &self.lines {
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

/// `1234567` → `1,234,567`.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
