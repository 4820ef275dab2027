//! XLSX export pipeline.
//!
//! Produces a fresh single-sheet workbook from a table slice. The header row
//! carries the column names and no index column is written.

pub(crate) mod package;
pub(crate) mod sheet_writer;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

use crate::error::{ConvertError, Result};
use crate::range::TableSlice;

/// Name used when the requested file name is blank.
pub const DEFAULT_FILE_NAME: &str = "converted_file.xlsx";

/// Sheet that receives the selection.
pub const DEFAULT_SHEET_NAME: &str = "Selection";

/// MIME type of the download.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const XLSX_SUFFIX: &str = ".xlsx";

/// A finished export, ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub file_name: String,
    pub mime: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Download {
    /// `data:` URL carrying the workbook, for browser download links.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Resolve the user's desired file name: trim, fall back to `default` when
/// blank, append `.xlsx` unless already present (case-insensitive).
#[must_use]
pub fn resolve_file_name_or(requested: &str, default: &str) -> String {
    let trimmed = requested.trim();
    let name = if trimmed.is_empty() { default.trim() } else { trimmed };
    if name.is_empty() {
        return DEFAULT_FILE_NAME.to_string();
    }
    if name.to_ascii_lowercase().ends_with(XLSX_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{XLSX_SUFFIX}")
    }
}

/// [`resolve_file_name_or`] with [`DEFAULT_FILE_NAME`].
#[must_use]
pub fn resolve_file_name(requested: &str) -> String {
    resolve_file_name_or(requested, DEFAULT_FILE_NAME)
}

/// Check a worksheet name against the spreadsheet format's rules.
///
/// # Errors
/// [`ConvertError::SheetName`] for empty, over-long (> 31 chars) names, names
/// with `[]:*?/\` or names starting/ending with an apostrophe.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    const FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

    let len = name.chars().count();
    if len == 0 || len > 31 {
        return Err(ConvertError::SheetName(format!(
            "{name:?} must be 1-31 characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(ConvertError::SheetName(format!(
            "{name:?} contains forbidden character {c:?}"
        )));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(ConvertError::SheetName(format!(
            "{name:?} cannot begin or end with an apostrophe"
        )));
    }
    Ok(())
}

/// Serialize `slice` to XLSX bytes with one sheet named `sheet_name`.
///
/// # Errors
/// Invalid sheet name or a ZIP write failure.
pub fn write_xlsx(slice: &TableSlice<'_>, sheet_name: &str) -> Result<Vec<u8>> {
    validate_sheet_name(sheet_name)?;
    let bytes = package::write_package(slice, sheet_name)?;
    tracing::debug!(
        sheet = sheet_name,
        rows = slice.rows.len(),
        bytes = bytes.len(),
        "wrote xlsx"
    );
    Ok(bytes)
}

/// Export `slice` and package it as a [`Download`] named after `requested`,
/// or `default_name` when `requested` is blank.
///
/// # Errors
/// See [`write_xlsx`].
pub fn export(
    slice: &TableSlice<'_>,
    sheet_name: &str,
    requested: &str,
    default_name: &str,
) -> Result<Download> {
    let bytes = write_xlsx(slice, sheet_name)?;
    Ok(Download {
        file_name: resolve_file_name_or(requested, default_name),
        mime: XLSX_MIME,
        bytes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", "converted_file.xlsx" ; "blank uses default")]
    #[test_case("   ", "converted_file.xlsx" ; "whitespace uses default")]
    #[test_case("report", "report.xlsx" ; "suffix appended")]
    #[test_case("report.XLSX", "report.XLSX" ; "suffix case preserved")]
    #[test_case("  report  ", "report.xlsx" ; "trimmed")]
    #[test_case("report.csv", "report.csv.xlsx" ; "other suffix kept")]
    #[test_case("archive.xlsx ", "archive.xlsx" ; "trailing space trimmed before check")]
    fn test_resolve_file_name(requested: &str, expected: &str) {
        assert_eq!(resolve_file_name(requested), expected);
    }

    #[test]
    fn test_custom_default() {
        assert_eq!(resolve_file_name_or(" ", "out"), "out.xlsx");
        assert_eq!(resolve_file_name_or("", " "), DEFAULT_FILE_NAME);
    }

    #[test_case("Selection" => true)]
    #[test_case("" => false)]
    #[test_case("a/b" => false)]
    #[test_case("'quoted'" => false)]
    #[test_case("0123456789012345678901234567890" => true ; "31 chars")]
    #[test_case("01234567890123456789012345678901" => false ; "32 chars")]
    fn test_sheet_names(name: &str) -> bool {
        validate_sheet_name(name).is_ok()
    }

    #[test]
    fn test_data_url() {
        let d = Download {
            file_name: "x.xlsx".into(),
            mime: XLSX_MIME,
            bytes: b"PK".to_vec(),
        };
        assert_eq!(
            d.data_url(),
            "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,UEs="
        );
    }

    #[test]
    fn test_export_rejects_bad_sheet_name() {
        let columns = vec!["a".to_string()];
        let rows = Vec::new();
        let slice = TableSlice {
            columns: &columns,
            rows: &rows,
        };
        assert!(matches!(
            export(&slice, "bad:name", "out", DEFAULT_FILE_NAME),
            Err(ConvertError::SheetName(_))
        ));
    }

    #[test]
    fn test_export_blank_name_uses_given_default() {
        let columns = vec!["a".to_string()];
        let rows = vec![vec![crate::table::CellValue::Number(1.0)]];
        let slice = TableSlice {
            columns: &columns,
            rows: &rows,
        };
        let download = export(&slice, DEFAULT_SHEET_NAME, "  ", "monthly").unwrap();
        assert_eq!(download.file_name, "monthly.xlsx");
        assert_eq!(download.mime, XLSX_MIME);
        assert!(download.bytes.starts_with(b"PK"));

        let named = export(&slice, DEFAULT_SHEET_NAME, "q3.XLSX", "monthly").unwrap();
        assert_eq!(named.file_name, "q3.XLSX");
    }
}
