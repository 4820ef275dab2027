//! xlconvert - delimited text to XLSX, whatever the encoding
//!
//! Takes an uploaded tab-delimited file of unknown encoding and exports a
//! chosen row range as a spreadsheet:
//! - Encoding sniffing (byte-order marks, UTF-16 patterns, statistical detection)
//! - Ordered, deduplicated fallback chain with a full attempt log
//! - 1-based inclusive row ranges with input clamping
//! - Single-sheet XLSX output with a bold header row
//!
//! # Usage (Rust)
//!
//! ```no_run
//! use xlconvert::{ConvertOptions, EncodingChoice, RangeInput, Session};
//!
//! let bytes = std::fs::read("upload.csv").unwrap();
//! let session = Session::new(bytes, ConvertOptions::default());
//! let loaded = session.load(&EncodingChoice::Auto).unwrap();
//! println!("{}", loaded.summary());
//! let download = loaded.export(RangeInput::default(), "report").unwrap();
//! std::fs::write(&download.file_name, &download.bytes).unwrap();
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { inspect_bytes, convert_bytes } from 'xlconvert';
//! await init();
//! const info = inspect_bytes(data, "Auto-detect");
//! const file = convert_bytes(data, "Auto-detect", 1, info.summary.rows, "report");
//! ```

pub mod cell_ref;
pub mod config;
pub mod encoding;
pub mod error;
pub mod export;
pub mod loader;
pub mod range;
pub mod session;
pub mod table;

use wasm_bindgen::prelude::*;

pub use config::ConvertOptions;
pub use encoding::EncodingChoice;
pub use error::ConvertError;
pub use export::{resolve_file_name, Download, DEFAULT_FILE_NAME, XLSX_MIME};
pub use loader::{Attempt, AttemptLog, Stage};
pub use range::{RangeInput, RowRange, TableSlice};
pub use session::{Diagnostics, Inspection, LoadedTable, Session, TableSummary};
pub use table::{CellValue, Table};

/// Run the whole pipeline on one upload: sniff, load, select, export.
///
/// # Errors
/// Exhausted decoding, an invalid range or an export failure.
pub fn convert(
    bytes: Vec<u8>,
    choice: &EncodingChoice,
    range: RangeInput,
    file_name: &str,
    options: ConvertOptions,
) -> error::Result<Download> {
    Session::new(bytes, options).load(choice)?.export(range, file_name)
}

/// Install the panic hook so Rust panics show up in the browser console.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Sniff and load the bytes, returning detection, summary, preview and
/// diagnostics as a plain JS object.
///
/// # Errors
/// Returns an error only if the result cannot be converted to a JS value.
#[wasm_bindgen]
pub fn inspect_bytes(data: &[u8], encoding: &str) -> std::result::Result<JsValue, JsValue> {
    let session = Session::new(data.to_vec(), ConvertOptions::default());
    let inspection = session.inspect(&EncodingChoice::parse(encoding));
    serde_wasm_bindgen::to_value(&inspection)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// Exported workbook handed back to JavaScript.
#[wasm_bindgen]
pub struct ExportedFile {
    inner: Download,
}

#[wasm_bindgen]
impl ExportedFile {
    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> String {
        self.inner.file_name.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.inner.mime.to_string()
    }

    /// Workbook bytes (a `Uint8Array` on the JS side).
    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn data_url(&self) -> String {
        self.inner.data_url()
    }
}

/// Load `data` and export rows `start..=end` (1-based; unset means whole table).
///
/// # Errors
/// The error message of any pipeline failure; exhausted loads list every attempt.
#[wasm_bindgen]
pub fn convert_bytes(
    data: &[u8],
    encoding: &str,
    start: Option<u32>,
    end: Option<u32>,
    file_name: &str,
) -> std::result::Result<ExportedFile, JsValue> {
    let range = RangeInput {
        start: start.map(i64::from),
        end: end.map(i64::from),
    };
    convert(
        data.to_vec(),
        &EncodingChoice::parse(encoding),
        range,
        file_name,
        ConvertOptions::default(),
    )
    .map(|inner| ExportedFile { inner })
    .map_err(|e| match &e {
        ConvertError::Exhausted { attempts } => {
            JsValue::from_str(&Diagnostics::from_attempts(attempts).to_string())
        }
        _ => JsValue::from_str(&e.to_string()),
    })
}

/// Encodings offered by the selector, `Auto-detect` first.
#[must_use]
#[wasm_bindgen]
pub fn encoding_options() -> Vec<String> {
    encoding::SELECTOR_OPTIONS
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
