//! Decoding and tokenizing of SFM text.

use std::borrow::Cow;
use std::path::Path;

use encoding_rs::{Encoding, WINDOWS_1252};

use crate::error::{IngestError, Result};

/// Markers starting with this character are tool metadata (e.g. `\_sh`) and
/// are dropped with their content.
pub const RESERVED_MARKER_PREFIX: char = '_';

/// One `\marker value` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfmField {
    /// Marker token without the backslash.
    pub marker: String,
    /// Field text; continuation lines are joined with `\n`.
    pub value: String,
    /// 1-based line of the marker.
    pub line: usize,
}

impl SfmField {
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Decode raw bytes: BOM first, then strict UTF-8, then Windows-1252.
pub fn decode_bytes(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            tracing::debug!("data is not UTF-8; decoding as windows-1252");
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text
        }
    }
}

/// Read, decode and tokenize a data file.
pub fn read_sfm_file(path: &Path) -> Result<Vec<SfmField>> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::read(path, e))?;
    let fields = parse_sfm(&decode_bytes(&bytes));
    tracing::debug!(path = %path.display(), fields = fields.len(), "read data file");
    Ok(fields)
}

/// Split SFM text into fields.
///
/// Text before the first marker is header and ignored. Lines that do not
/// start with a marker continue the previous field. Reserved markers and
/// their continuations are dropped.
pub fn parse_sfm(text: &str) -> Vec<SfmField> {
    let mut fields: Vec<SfmField> = Vec::new();
    // `false` while inside a header or a reserved field.
    let mut collecting = false;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if let Some((marker, value)) = split_marker(line) {
            collecting = !marker.starts_with(RESERVED_MARKER_PREFIX);
            if collecting {
                fields.push(SfmField {
                    marker: marker.to_string(),
                    value: value.trim_end().to_string(),
                    line: index + 1,
                });
            }
            continue;
        }

        let continuation = line.trim();
        if !collecting || continuation.is_empty() {
            continue;
        }
        if let Some(field) = fields.last_mut() {
            if !field.value.is_empty() {
                field.value.push('\n');
            }
            field.value.push_str(continuation);
        }
    }
    fields
}

fn split_marker(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('\\')?;
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let (marker, value) = rest.split_at(end);
    Some((marker, value.strip_prefix([' ', '\t']).unwrap_or(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_markers_and_continuations() {
        let text = "\\_sh v3.0  400  MDF 4.0\n\n\\lx kala\n\\ge fish\n  big one\n\\ps\n";
        let fields = parse_sfm(text);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].marker, "lx");
        assert_eq!(fields[0].line, 3);
        assert_eq!(fields[1].value, "fish\nbig one");
        assert!(fields[2].is_empty());
    }

    #[test]
    fn header_text_before_first_marker_is_ignored() {
        let fields = parse_sfm("Dictionary export\nby hand\n\\lx a\n");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value, "a");
    }

    #[test]
    fn reserved_continuations_are_dropped() {
        let fields = parse_sfm("\\_DateStamp 2001\nmore\n\\lx a\n");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].marker, "lx");
    }

    #[test]
    fn legacy_bytes_fall_back_to_windows_1252() {
        let bytes = b"\\lx caf\xe9\n";
        assert_eq!(decode_bytes(bytes), "\\lx caf\u{e9}\n");
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let bytes = b"\xef\xbb\xbf\\lx a\n";
        let fields = parse_sfm(&decode_bytes(bytes));
        assert_eq!(fields[0].marker, "lx");
    }

    #[test]
    fn crlf_line_endings() {
        let fields = parse_sfm("\\lx a\r\n\\ge b\r\n");
        assert_eq!(fields[1].value, "b");
    }
}
