pub mod file_loader;
pub mod kv_parser;

pub use file_loader::{load, load_reader, parse_line};
pub use kv_parser::parse_kv_line;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading an input source
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
