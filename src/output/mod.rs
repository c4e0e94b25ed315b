use crate::models::Finding;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while writing findings
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output handler for findings
pub struct OutputHandler {
    format: OutputFormat,
    writer: Box<dyn Write + Send>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `rule_id | severity | description`
    Text,
    /// Aligned columns for a terminal
    Console,
    Json,
    Jsonl,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "console" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Plain-text block of findings for downstream consumers, one
/// `rule_id | severity | description` line each. A `limit` of 0 means
/// no limit.
pub fn summarize(findings: &[Finding], limit: usize) -> String {
    if findings.is_empty() {
        return "No anomalies".to_string();
    }
    let limit = if limit == 0 { findings.len() } else { limit };
    findings
        .iter()
        .take(limit)
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl OutputHandler {
    /// Create an output handler writing to a file, or stdout when no path is given
    pub fn new(format: OutputFormat, file_path: Option<PathBuf>) -> Result<Self, OutputError> {
        let writer: Box<dyn Write + Send> = match file_path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(path)?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout()),
        };
        Ok(Self::with_writer(format, writer))
    }

    pub fn with_writer(format: OutputFormat, writer: Box<dyn Write + Send>) -> Self {
        OutputHandler { format, writer }
    }

    /// Write a batch of findings
    pub fn write_findings(&mut self, findings: &[Finding]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, findings)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Console => {
                writeln!(self.writer, "{:<6}  {:<30}  DESCRIPTION", "SEV", "RULE")?;
                for finding in findings {
                    self.write_finding(finding)?;
                }
            }
            OutputFormat::Text | OutputFormat::Jsonl => {
                for finding in findings {
                    self.write_finding(finding)?;
                }
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Write a single finding
    pub fn write_finding(&mut self, finding: &Finding) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{}", finding)?,
            OutputFormat::Console => writeln!(
                self.writer,
                "{:<6}  {:<30}  {}",
                finding.severity.as_str().to_uppercase(),
                finding.rule_id,
                finding.description
            )?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, finding)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Jsonl => {
                serde_json::to_writer(&mut self.writer, finding)?;
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }

    /// Flush any buffered output
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}
