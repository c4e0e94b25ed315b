//! Line-oriented loading of audit log files
//!
//! Each non-blank line is decoded as a JSON object, falling back to
//! `key=value` extraction. Lines yielding neither are logged and skipped;
//! a bad line never aborts the load.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use serde_json::Value;

use super::kv_parser::parse_kv_line;
use super::IngestError;
use crate::models::RawRecord;

/// Load all records from a file, in file order
pub fn load(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = load_reader(BufReader::new(file), &path.display().to_string())
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("Loaded {} record(s) from {:?}", records.len(), path);
    Ok(records)
}

/// Load all records from a buffered reader.
///
/// `source_name` only labels diagnostics. Invalid UTF-8 is replaced
/// rather than rejected.
pub fn load_reader<R: BufRead>(mut reader: R, source_name: &str) -> std::io::Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    let mut buf = Vec::new();
    let mut line_number = 0usize;

    loop {
        buf.clear();
        let bytes_read = reader.read_until(b'\n', &mut buf)?;
        if bytes_read == 0 {
            break; // EOF
        }
        line_number += 1;

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Some(record) => records.push(record),
            None => log::warn!("Skipped unparseable line {} in {}", line_number, source_name),
        }
    }

    Ok(records)
}

/// Decode a single line: a JSON object, else its `key=value` tokens.
///
/// JSON arrays and scalars are not records and fall through to key=value
/// scanning.
pub fn parse_line(line: &str) -> Option<RawRecord> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(line) {
        return Some(map);
    }

    let record = parse_kv_line(line);
    if record.is_empty() {
        None
    } else {
        Some(record)
    }
}
