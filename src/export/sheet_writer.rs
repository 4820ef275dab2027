//! Generates worksheet XML from a table slice.
//!
//! Text uses inline strings (`t="inlineStr"`) so no shared string table is
//! needed. Row 1 is the header, written with the bold header style.

use quick_xml::escape::escape;

use crate::cell_ref::{cell_ref, dimension_ref};
use crate::range::TableSlice;
use crate::table::CellValue;

/// `cellXfs` index of the bold, bordered header style in `styles.xml`.
pub(crate) const HEADER_STYLE: u32 = 1;

/// Write a complete worksheet XML string for `slice` (header + rows).
pub(crate) fn write_sheet_xml(slice: &TableSlice<'_>) -> String {
    let mut out = String::with_capacity(4096 + slice.rows.len() * 64);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    );
    out.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    out.push('\n');

    // <dimension>
    let total_rows = u32::try_from(slice.rows.len() + 1).unwrap_or(u32::MAX);
    let total_cols = u32::try_from(slice.columns.len()).unwrap_or(u32::MAX);
    out.push_str(&format!(
        "<dimension ref=\"{}\"/>\n",
        dimension_ref(total_rows, total_cols)
    ));

    // <sheetViews>
    out.push_str("<sheetViews><sheetView tabSelected=\"1\" workbookViewId=\"0\"/></sheetViews>\n");
    out.push_str("<sheetFormatPr defaultRowHeight=\"15\"/>\n");

    // <sheetData>
    out.push_str("<sheetData>\n");
    write_header_row(&mut out, slice.columns);
    for (idx, row) in slice.rows.iter().enumerate() {
        let r = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        write_data_row(&mut out, r, row);
    }
    out.push_str("</sheetData>\n");

    out.push_str("</worksheet>");
    out
}

fn write_header_row(out: &mut String, columns: &[String]) {
    if columns.is_empty() {
        return;
    }
    out.push_str("<row r=\"1\">");
    for (c, name) in columns.iter().enumerate() {
        let col = u32::try_from(c).unwrap_or(u32::MAX);
        write_inline_str(out, &cell_ref(0, col), name, Some(HEADER_STYLE));
    }
    out.push_str("</row>\n");
}

/// Write one data row; `r` is the 0-indexed sheet row (header is row 0).
fn write_data_row(out: &mut String, r: u32, cells: &[CellValue]) {
    out.push_str(&format!("<row r=\"{}\">", u64::from(r) + 1));
    for (c, value) in cells.iter().enumerate() {
        let col = u32::try_from(c).unwrap_or(u32::MAX);
        write_cell(out, r, col, value);
    }
    out.push_str("</row>\n");
}

/// Write a single `<c>` element. Empty cells are omitted.
fn write_cell(out: &mut String, row: u32, col: u32, value: &CellValue) {
    let reference = cell_ref(row, col);
    match value {
        CellValue::Empty => {}
        CellValue::Number(n) if n.is_finite() => {
            out.push_str(&format!("<c r=\"{reference}\"><v>{n}</v></c>"));
        }
        CellValue::Number(n) => {
            let text = if n.is_sign_negative() { "-inf" } else { "inf" };
            write_inline_str(out, &reference, text, None);
        }
        CellValue::Bool(b) => {
            let v = if *b { "1" } else { "0" };
            out.push_str(&format!("<c r=\"{reference}\" t=\"b\"><v>{v}</v></c>"));
        }
        CellValue::Text(s) => write_inline_str(out, &reference, s, None),
    }
}

fn write_inline_str(out: &mut String, reference: &str, text: &str, style: Option<u32>) {
    out.push_str(&format!("<c r=\"{reference}\""));
    if let Some(s) = style {
        out.push_str(&format!(" s=\"{s}\""));
    }
    out.push_str(" t=\"inlineStr\"><is><t");
    if needs_space_preserve(text) {
        out.push_str(" xml:space=\"preserve\"");
    }
    out.push('>');
    out.push_str(&escape(xml_safe(text).as_str()));
    out.push_str("</t></is></c>");
}

fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

/// Drop characters XML 1.0 cannot carry (C0 controls other than tab/LF/CR, U+FFFE/U+FFFF).
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || (c >= '\u{20}' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::table::Row;

    fn slice_xml(columns: &[&str], rows: Vec<Row>) -> String {
        let columns: Vec<String> = columns.iter().map(|s| (*s).to_string()).collect();
        write_sheet_xml(&TableSlice {
            columns: &columns,
            rows: &rows,
        })
    }

    #[test]
    fn test_header_and_row() {
        let xml = slice_xml(
            &["id", "name"],
            vec![vec![CellValue::Number(1.0), CellValue::Text("Ada".into())]],
        );
        assert!(xml.contains("<dimension ref=\"A1:B2\"/>"));
        assert!(xml.contains(r#"<c r="A1" s="1" t="inlineStr"><is><t>id</t></is></c>"#));
        assert!(xml.contains(r#"<c r="B1" s="1" t="inlineStr"><is><t>name</t></is></c>"#));
        assert!(xml.contains(r#"<c r="A2"><v>1</v></c>"#));
        assert!(xml.contains(r#"<c r="B2" t="inlineStr"><is><t>Ada</t></is></c>"#));
    }

    #[test]
    fn test_empty_cells_are_omitted() {
        let xml = slice_xml(&["a", "b"], vec![vec![CellValue::Empty, CellValue::Bool(true)]]);
        assert!(!xml.contains("r=\"A2\""));
        assert!(xml.contains(r#"<c r="B2" t="b"><v>1</v></c>"#));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = slice_xml(&["a"], vec![vec![CellValue::Text("<b> & \"q\"".into())]]);
        assert!(xml.contains("&lt;b&gt; &amp; &quot;q&quot;"));
    }

    #[test]
    fn test_control_characters_dropped() {
        assert_eq!(xml_safe("a\u{1}b\tc"), "ab\tc");
    }

    #[test]
    fn test_infinity_written_as_text() {
        let xml = slice_xml(&["x"], vec![vec![CellValue::Number(f64::NEG_INFINITY)]]);
        assert!(xml.contains("<t>-inf</t>"));
    }

    #[test]
    fn test_leading_space_preserved() {
        let xml = slice_xml(&["x"], vec![vec![CellValue::Text(" pad".into())]]);
        assert!(xml.contains(r#"<t xml:space="preserve"> pad</t>"#));
    }
}
