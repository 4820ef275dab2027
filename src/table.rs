//! Tabular data model and the delimited-text parser that produces it.
//!
//! The first record is the header. Column types are inferred per column:
//! a column whose every non-missing value is numeric (or boolean) becomes
//! numeric (or boolean); anything else keeps the original text.

use std::collections::HashSet;

use csv::ReaderBuilder;
use serde::Serialize;

use crate::error::{ConvertError, Result};

/// Field separator of uploaded files. Tab, even for files named `.csv`.
pub const TAB: u8 = b'\t';

/// Tokens read as a missing value.
const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single parsed value.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One data row; always as wide as the header.
pub type Row = Vec<CellValue>;

/// Parsed table: header names plus data rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Number of data rows (header excluded).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// First `n` data rows.
    #[must_use]
    pub fn preview(&self, n: usize) -> &[Row] {
        self.rows.get(..n.min(self.rows.len())).unwrap_or_default()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ColumnKind {
    Missing,
    Number,
    Bool,
    Text,
}

/// Parse delimited text into a [`Table`].
///
/// # Errors
/// [`ConvertError::Parse`] when there is no header, a record is wider than
/// the header, or the text contains NUL characters.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Table> {
    if let Some(pos) = text.find('\0') {
        let line = text.get(..pos).map_or(0, |head| head.matches('\n').count()) + 1;
        return Err(ConvertError::Parse(format!("NUL character in line {line}")));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(ConvertError::Parse("No columns to parse from file".into())),
    };
    let columns = dedupe_columns(header.iter());
    let width = columns.len();

    let mut raw: Vec<Vec<String>> = Vec::new();
    for record in records {
        let record = record?;
        if record.len() > width {
            let line = record.position().map_or(raw.len() + 2, |p| {
                usize::try_from(p.line()).unwrap_or(usize::MAX)
            });
            return Err(ConvertError::Parse(format!(
                "Error tokenizing data. Expected {width} fields in line {line}, saw {}",
                record.len()
            )));
        }
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        fields.resize(width, String::new());
        raw.push(fields);
    }

    let kinds: Vec<ColumnKind> = (0..width).map(|col| infer_column(&raw, col)).collect();
    let rows = raw
        .into_iter()
        .map(|fields| {
            fields
                .into_iter()
                .zip(kinds.iter().copied())
                .map(|(field, kind)| to_cell(field, kind))
                .collect()
        })
        .collect();

    tracing::trace!(columns = width, "parsed delimited text");
    Ok(Table { columns, rows })
}

/// Make header names unique (`a`, `a.1`, `a.2`) and name blank headers by position.
fn dedupe_columns<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for (idx, name) in names.enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name.to_string()
        };
        let mut candidate = base.clone();
        let mut n = 0usize;
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{base}.{n}");
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

fn is_missing(value: &str) -> bool {
    MISSING_TOKENS.contains(&value)
}

fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    // f64::from_str accepts NaN spellings; those stay text.
    if trimmed.eq_ignore_ascii_case("nan") {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

fn infer_column(raw: &[Vec<String>], col: usize) -> ColumnKind {
    let mut kind = ColumnKind::Missing;

    for value in raw.iter().filter_map(|row| row.get(col)) {
        if is_missing(value) {
            continue;
        }
        let this = if parse_number(value).is_some() {
            ColumnKind::Number
        } else if parse_bool(value).is_some() {
            ColumnKind::Bool
        } else {
            return ColumnKind::Text;
        };
        kind = match kind {
            ColumnKind::Missing => this,
            same if same == this => same,
            _ => return ColumnKind::Text,
        };
    }

    kind
}

fn to_cell(field: String, kind: ColumnKind) -> CellValue {
    if is_missing(&field) {
        return CellValue::Empty;
    }
    match kind {
        ColumnKind::Number => parse_number(&field).map_or(CellValue::Text(field), CellValue::Number),
        ColumnKind::Bool => parse_bool(&field).map_or(CellValue::Text(field), CellValue::Bool),
        ColumnKind::Missing | ColumnKind::Text => CellValue::Text(field),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tsv_basic() {
        let table = parse_delimited("Name\tAge\tCity\nAlice\t30\tNYC\nBob\t25\tLA", TAB).unwrap();
        assert_eq!(table.columns, vec!["Name", "Age", "City"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][0], CellValue::Text("Alice".into()));
        assert_eq!(table.rows[1][1], CellValue::Number(25.0));
    }

    #[test]
    fn test_comma_is_not_a_separator() {
        let table = parse_delimited("a,b\n1,2", TAB).unwrap();
        assert_eq!(table.columns, vec!["a,b"]);
        assert_eq!(table.rows[0][0], CellValue::Text("1,2".into()));
    }

    #[test]
    fn test_mixed_column_keeps_text() {
        let table = parse_delimited("code\n007\nA12", TAB).unwrap();
        assert_eq!(table.rows[0][0], CellValue::Text("007".into()));
        assert_eq!(table.rows[1][0], CellValue::Text("A12".into()));
    }

    #[test]
    fn test_numeric_column_with_missing_values() {
        let table = parse_delimited("x\ty\n1.5\tNA\n\t2\n-3\tnull", TAB).unwrap();
        assert_eq!(table.rows[0][0], CellValue::Number(1.5));
        assert_eq!(table.rows[1][0], CellValue::Empty);
        assert_eq!(table.rows[2][0], CellValue::Number(-3.0));
        assert_eq!(table.rows[0][1], CellValue::Empty);
        assert_eq!(table.rows[1][1], CellValue::Number(2.0));
    }

    #[test]
    fn test_bool_column() {
        let table = parse_delimited("flag\nTrue\nfalse", TAB).unwrap();
        assert_eq!(table.rows[0][0], CellValue::Bool(true));
        assert_eq!(table.rows[1][0], CellValue::Bool(false));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = parse_delimited("a\tb\tc\n1", TAB).unwrap();
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.rows[0][2], CellValue::Empty);
    }

    #[test]
    fn test_wide_row_is_rejected() {
        let err = parse_delimited("a\tb\n1\t2\n1\t2\t3", TAB).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error: Error tokenizing data. Expected 2 fields in line 3, saw 3"
        );
    }

    #[test]
    fn test_empty_input_has_no_columns() {
        let err = parse_delimited("", TAB).unwrap_err();
        assert!(err.to_string().contains("No columns to parse from file"));
    }

    #[test]
    fn test_nul_is_rejected_with_line() {
        let err = parse_delimited("a\tb\n1\0\t2", TAB).unwrap_err();
        assert!(err.to_string().contains("NUL character in line 2"), "{err}");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let table = parse_delimited("a\n1\n\n2\n", TAB).unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_quoted_field_with_tab() {
        let table = parse_delimited("a\tb\n\"x\ty\"\t\"say \"\"hi\"\"\"", TAB).unwrap();
        assert_eq!(table.rows[0][0], CellValue::Text("x\ty".into()));
        assert_eq!(table.rows[0][1], CellValue::Text("say \"hi\"".into()));
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let table = parse_delimited("a\ta\t\ta\n1\t2\t3\t4", TAB).unwrap();
        assert_eq!(table.columns, vec!["a", "a.1", "Unnamed: 2", "a.2"]);
    }

    #[test]
    fn test_header_only() {
        let table = parse_delimited("id\tname\n", TAB).unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_preview_is_bounded() {
        let table = parse_delimited("a\n1\n2\n3", TAB).unwrap();
        assert_eq!(table.preview(2).len(), 2);
        assert_eq!(table.preview(10).len(), 3);
    }
}
