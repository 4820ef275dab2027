//! Strict byte → text decoding for a single encoding label.
//!
//! No replacement characters are ever produced: the first malformed sequence
//! fails the whole decode with the label, byte offset and offending byte.

use encoding_rs::{DecoderResult, Encoding, UTF_16BE, UTF_16LE, UTF_8};

use super::normalize_label;
use crate::error::{ConvertError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const UTF16LE_BOM: &[u8] = b"\xFF\xFE";
const UTF16BE_BOM: &[u8] = b"\xFE\xFF";

/// How a label maps onto a concrete decoder.
enum Scheme {
    /// UTF-8, optional leading BOM stripped.
    Utf8,
    /// UTF-16 with BOM-selected endianness, little-endian without one.
    Utf16,
    /// One byte per code point, U+0000..=U+00FF.
    Latin1,
    /// 7-bit only.
    Ascii,
    /// Anything the WHATWG label registry knows.
    Whatwg(&'static Encoding),
}

fn resolve(label: &str) -> Option<Scheme> {
    let scheme = match normalize_label(label).as_str() {
        "utf-8" | "utf8" | "utf-8-sig" | "utf8-sig" | "u8" => Scheme::Utf8,
        "utf-16" | "utf16" | "u16" => Scheme::Utf16,
        "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" | "8859" | "cp819" | "l1" => {
            Scheme::Latin1
        }
        "ascii" | "us-ascii" | "646" => Scheme::Ascii,
        other => Scheme::Whatwg(Encoding::for_label(other.as_bytes())?),
    };
    Some(scheme)
}

/// Decode `bytes` as `label`, failing on the first malformed sequence.
///
/// # Errors
/// [`ConvertError::Decode`] for unknown labels and malformed input.
pub fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let scheme =
        resolve(label).ok_or_else(|| ConvertError::decode(label, format!("unknown encoding: {label}")))?;

    match scheme {
        Scheme::Utf8 => {
            let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            decode_with(UTF_8, label, body, bytes.len() - body.len())
        }
        Scheme::Utf16 => {
            if let Some(body) = bytes.strip_prefix(UTF16LE_BOM) {
                decode_with(UTF_16LE, label, body, UTF16LE_BOM.len())
            } else if let Some(body) = bytes.strip_prefix(UTF16BE_BOM) {
                decode_with(UTF_16BE, label, body, UTF16BE_BOM.len())
            } else {
                decode_with(UTF_16LE, label, bytes, 0)
            }
        }
        Scheme::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        Scheme::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
            Some(pos) => Err(malformed(label, bytes, pos, "ordinal not in range(128)").into()),
            None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        },
        Scheme::Whatwg(encoding) => decode_with(encoding, label, bytes, 0),
    }
}

/// Run an `encoding_rs` decoder over `body` without replacement.
///
/// `offset` is the number of bytes (a BOM) skipped before `body`, so reported
/// positions refer to the original buffer.
fn decode_with(encoding: &'static Encoding, label: &str, body: &[u8], offset: usize) -> Result<String> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(body.len())
        .unwrap_or(body.len());
    let mut out = String::with_capacity(capacity);
    let mut consumed = 0usize;

    loop {
        let src = body.get(consumed..).unwrap_or_default();
        let (result, read) = decoder.decode_to_string_without_replacement(src, &mut out, true);
        consumed += read;

        match result {
            DecoderResult::InputEmpty => return Ok(out),
            DecoderResult::OutputFull => {
                let remaining = body.len().saturating_sub(consumed);
                out.reserve(
                    decoder
                        .max_utf8_buffer_length_without_replacement(remaining)
                        .unwrap_or(remaining)
                        .max(4),
                );
            }
            DecoderResult::Malformed(bad, after) => {
                let pos = consumed.saturating_sub(usize::from(bad) + usize::from(after));
                let reason = if pos + usize::from(bad) >= body.len() {
                    "unexpected end of data"
                } else {
                    "invalid sequence"
                };
                return Err(malformed(label, body, pos, reason).shifted(offset));
            }
        }
    }
}

/// Position-carrying failure, rendered once the final offset is known.
struct Malformed {
    label: String,
    byte: Option<u8>,
    pos: usize,
    reason: &'static str,
}

impl Malformed {
    fn shifted(mut self, offset: usize) -> ConvertError {
        self.pos += offset;
        self.into()
    }
}

impl From<Malformed> for ConvertError {
    fn from(m: Malformed) -> Self {
        let detail = match m.byte {
            Some(b) => format!(
                "'{}' codec can't decode byte 0x{b:02x} in position {}: {}",
                m.label, m.pos, m.reason
            ),
            None => format!("'{}' codec can't decode at position {}: {}", m.label, m.pos, m.reason),
        };
        ConvertError::decode(&m.label, detail)
    }
}

fn malformed(label: &str, bytes: &[u8], pos: usize, reason: &'static str) -> Malformed {
    Malformed {
        label: label.to_string(),
        byte: bytes.get(pos).copied(),
        pos,
        reason,
    }
}
