//! `key=value` extraction for free-form log lines
//!
//! Keys are runs of `[A-Za-z0-9_.]`. A value is either a double-quoted
//! string honouring `\"` and `\\` escapes, or a run of non-whitespace.
//! Text between tokens is ignored; a repeated key keeps its last value.

use serde_json::Value;

use crate::models::RawRecord;

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Extract all `key=value` tokens from a line.
///
/// Returns an empty record when the line holds no tokens.
pub fn parse_kv_line(line: &str) -> RawRecord {
    let mut record = RawRecord::new();
    let mut pos = 0;

    while pos < line.len() {
        let rest = &line[pos..];
        let key_len = rest.bytes().take_while(|b| is_key_byte(*b)).count();

        if key_len == 0 {
            pos += rest.chars().next().map_or(1, char::len_utf8);
            continue;
        }

        let key = &rest[..key_len];
        if let Some(value_src) = rest[key_len..].strip_prefix('=') {
            if let Some((value, consumed)) = scan_value(value_src) {
                record.insert(key.to_string(), Value::String(value));
                pos += key_len + 1 + consumed;
                continue;
            }
        }

        // Any key starting inside this run ends at the same place and
        // would fail the same way.
        pos += key_len;
    }

    record
}

/// Scan a value at the start of `src`. Returns the decoded value and the
/// number of bytes consumed.
fn scan_value(src: &str) -> Option<(String, usize)> {
    if src.starts_with('"') {
        if let Some(quoted) = scan_quoted(src) {
            return Some(quoted);
        }
    }

    let len = src.find(char::is_whitespace).unwrap_or(src.len());
    if len == 0 {
        return None;
    }
    Some((src[..len].to_string(), len))
}

/// Scan a double-quoted string. `None` if the closing quote is missing.
fn scan_quoted(src: &str) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = src.char_indices().skip(1);

    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Some((value, idx + 1)),
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    '"' | '\\' => value.push(escaped),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            }
            other => value.push(other),
        }
    }

    None
}
