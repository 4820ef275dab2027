//! Common test utilities: fixture builders and an XLSX reader.
//!
//! The reader only understands what the exporter writes (one worksheet,
//! inline strings, numbers and booleans), which is all the assertions need.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

// ============================================================================
// Fixture builders
// ============================================================================

/// UTF-16LE with a byte-order mark, the way spreadsheet tools save "Unicode text".
#[must_use]
pub fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// UTF-16LE without a byte-order mark.
#[must_use]
pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// A one-column table `n` with rows `1..=rows`.
#[must_use]
pub fn numbered_rows(rows: usize) -> Vec<u8> {
    let mut text = String::from("n\n");
    for i in 1..=rows {
        text.push_str(&format!("{i}\n"));
    }
    text.into_bytes()
}

// ============================================================================
// XLSX reader
// ============================================================================

/// One cell as stored in the worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetCell {
    pub reference: String,
    pub kind: Option<String>,
    pub style: Option<String>,
    pub value: String,
}

/// The single worksheet of an exported workbook.
#[derive(Debug, Clone)]
pub struct SheetDump {
    pub name: String,
    pub dimension: Option<String>,
    pub rows: Vec<Vec<SheetCell>>,
}

impl SheetDump {
    /// Row values with empty cells filled in, header first.
    #[must_use]
    pub fn values(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut out = Vec::new();
                for cell in row {
                    let col = column_index(&cell.reference);
                    while out.len() < col {
                        out.push(String::new());
                    }
                    out.push(cell.value.clone());
                }
                out
            })
            .collect()
    }

    #[must_use]
    pub fn cell(&self, reference: &str) -> Option<&SheetCell> {
        self.rows.iter().flatten().find(|c| c.reference == reference)
    }
}

/// Read a part of the archive as text.
#[must_use]
pub fn read_part(xlsx: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(xlsx)).expect("Failed to open ZIP archive");
    let mut xml = String::new();
    archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing part {name}"))
        .read_to_string(&mut xml)
        .expect("part is not UTF-8");
    xml
}

/// Parse the sheet name and cell contents out of an exported workbook.
#[must_use]
pub fn read_sheet(xlsx: &[u8]) -> SheetDump {
    let name = sheet_name(&read_part(xlsx, "xl/workbook.xml"));
    let sheet = read_part(xlsx, "xl/worksheets/sheet1.xml");

    let mut reader = Reader::from_str(&sheet);
    let mut dimension = None;
    let mut rows: Vec<Vec<SheetCell>> = Vec::new();
    let mut current: Option<SheetCell> = None;
    let mut in_value = false;

    loop {
        match reader.read_event().expect("malformed sheet xml") {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"dimension" => {
                dimension = attr(&e, "ref");
            }
            Event::Start(e) if e.name().as_ref() == b"row" => rows.push(Vec::new()),
            Event::Start(e) if e.name().as_ref() == b"c" => {
                current = Some(SheetCell {
                    reference: attr(&e, "r").expect("cell without reference"),
                    kind: attr(&e, "t"),
                    style: attr(&e, "s"),
                    value: String::new(),
                });
            }
            Event::Start(e) if matches!(e.name().as_ref(), b"v" | b"t") => in_value = true,
            Event::Text(t) if in_value => {
                if let Some(cell) = current.as_mut() {
                    cell.value.push_str(&t.unescape().expect("bad escape"));
                }
            }
            Event::End(e) if matches!(e.name().as_ref(), b"v" | b"t") => in_value = false,
            Event::End(e) if e.name().as_ref() == b"c" => {
                if let (Some(cell), Some(row)) = (current.take(), rows.last_mut()) {
                    row.push(cell);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    SheetDump {
        name,
        dimension,
        rows,
    }
}

fn sheet_name(workbook: &str) -> String {
    let mut reader = Reader::from_str(workbook);
    loop {
        match reader.read_event().expect("malformed workbook xml") {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"sheet" => {
                return attr(&e, "name").expect("sheet without name");
            }
            Event::Eof => panic!("workbook has no sheet"),
            _ => {}
        }
    }
}

fn attr(e: &quick_xml::events::BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .expect("bad attribute")
        .map(|a| a.unescape_value().expect("bad attribute value").into_owned())
}

/// `"B7"` → 1.
fn column_index(reference: &str) -> usize {
    reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1))
        - 1
}
