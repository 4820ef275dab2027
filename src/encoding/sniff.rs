//! Best-guess encoding detection over raw bytes.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

/// Share of NUL bytes on one parity that marks BOM-less UTF-16.
const UTF16_NUL_RATIO: f64 = 0.3;

/// Propose an encoding label for `bytes`, or `None` when inconclusive.
///
/// A byte-order mark decides immediately. BOM-less UTF-16 is recognized by
/// its NUL pattern and valid UTF-8 (including pure ASCII) is reported as
/// `utf-8`. Everything else goes through the statistical detector, whose
/// low-confidence guesses are dropped.
#[must_use]
pub fn sniff(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }

    if let Some((encoding, _bom_len)) = Encoding::for_bom(bytes) {
        let label = if encoding == UTF_8 { "utf-8-sig" } else { "utf-16" };
        tracing::debug!(label, "encoding decided by byte-order mark");
        return Some(label.to_string());
    }

    if looks_like_utf16(bytes) {
        tracing::debug!("NUL pattern suggests BOM-less UTF-16");
        return Some("utf-16".to_string());
    }

    if std::str::from_utf8(bytes).is_ok() {
        return Some("utf-8".to_string());
    }

    let mut detector = EncodingDetector::new();
    let _saw_non_ascii = detector.feed(bytes, true);

    let (encoding, confident) = detector.guess_assess(None, true);
    assessed_label(encoding, confident)
}

/// Label for a detector guess; low-confidence guesses are dropped.
fn assessed_label(encoding: &'static Encoding, confident: bool) -> Option<String> {
    if !confident {
        tracing::debug!(guess = encoding.name(), "detector guess below confidence threshold");
        return None;
    }
    if encoding == UTF_16LE || encoding == UTF_16BE {
        return Some("utf-16".to_string());
    }
    Some(encoding.name().to_ascii_lowercase())
}

/// Even-length buffer where one byte parity is mostly NUL and the other has none.
fn looks_like_utf16(bytes: &[u8]) -> bool {
    if bytes.len() < 4 || bytes.len() % 2 != 0 {
        return false;
    }

    let (mut even_nul, mut odd_nul) = (0usize, 0usize);
    for pair in bytes.chunks_exact(2) {
        if let [even, odd] = pair {
            even_nul += usize::from(*even == 0);
            odd_nul += usize::from(*odd == 0);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let half = (bytes.len() / 2) as f64;
    #[allow(clippy::cast_precision_loss)]
    let (even_ratio, odd_ratio) = (even_nul as f64 / half, odd_nul as f64 / half);

    (odd_ratio >= UTF16_NUL_RATIO && even_nul == 0) || (even_ratio >= UTF16_NUL_RATIO && odd_nul == 0)
}
