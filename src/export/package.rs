//! Assemble a single-sheet XLSX package (OPC ZIP) in memory.
//!
//! Every part is deflate-compressed. The worksheet body comes from
//! [`write_sheet_xml`]; the remaining parts are fixed boilerplate with the
//! sheet name spliced into the workbook and app properties.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::range::TableSlice;

use super::sheet_writer::write_sheet_xml;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Write the full package for `slice` under `sheet_name`.
///
/// Returns the XLSX file as `Vec<u8>`.
pub(crate) fn write_package(slice: &TableSlice<'_>, sheet_name: &str) -> Result<Vec<u8>> {
    let sheet_xml = write_sheet_xml(slice);
    let buf: Vec<u8> = Vec::with_capacity(sheet_xml.len() / 4 + 4096);
    let mut writer = ZipWriter::new(Cursor::new(buf));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, String); 8] = [
        ("[Content_Types].xml", content_types()),
        ("_rels/.rels", root_rels()),
        ("docProps/app.xml", app_props(sheet_name)),
        ("docProps/core.xml", core_props()),
        ("xl/workbook.xml", workbook(sheet_name)),
        ("xl/_rels/workbook.xml.rels", workbook_rels()),
        ("xl/styles.xml", styles()),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ];

    for (name, xml) in &parts {
        writer.start_file(*name, options)?;
        writer.write_all(xml.as_bytes())?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Generate [Content_Types].xml
fn content_types() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);
    xml.push_str("</Types>");
    xml
}

/// Generate _rels/.rels
fn root_rels() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#);
    xml.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#);
    xml.push_str(r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

fn app_props(sheet_name: &str) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#);
    xml.push_str("<Application>xlconvert</Application>");
    xml.push_str(r#"<TitlesOfParts><vt:vector size="1" baseType="lpstr">"#);
    xml.push_str(&format!("<vt:lpstr>{}</vt:lpstr>", escape(sheet_name)));
    xml.push_str("</vt:vector></TitlesOfParts>");
    xml.push_str("</Properties>");
    xml
}

fn core_props() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    xml.push_str("<dc:creator>xlconvert</dc:creator>");
    xml.push_str("</cp:coreProperties>");
    xml
}

/// Generate xl/workbook.xml
fn workbook(sheet_name: &str) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str(r#"<bookViews><workbookView activeTab="0"/></bookViews>"#);
    xml.push_str(&format!(
        r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>"#,
        escape(sheet_name)
    ));
    xml.push_str("</workbook>");
    xml
}

/// Generate xl/_rels/workbook.xml.rels
fn workbook_rels() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#);
    xml.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

/// Two cell formats: 0 = default, 1 = bold header with thin border, centered.
fn styles() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
    xml.push_str(r#"<fonts count="2">"#);
    xml.push_str(r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#);
    xml.push_str(r#"<font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#);
    xml.push_str("</fonts>");
    xml.push_str(r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#);
    xml.push_str(r#"<borders count="2">"#);
    xml.push_str("<border><left/><right/><top/><bottom/><diagonal/></border>");
    xml.push_str(r#"<border><left style="thin"/><right style="thin"/><top style="thin"/><bottom style="thin"/><diagonal/></border>"#);
    xml.push_str("</borders>");
    xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
    xml.push_str(r#"<cellXfs count="2">"#);
    xml.push_str(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#);
    xml.push_str(r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="1" xfId="0" applyFont="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center" vertical="top"/></xf>"#);
    xml.push_str("</cellXfs>");
    xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
    xml.push_str("</styleSheet>");
    xml
}
