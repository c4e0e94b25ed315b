pub mod config;
pub mod detection;
pub mod input;
pub mod models;
pub mod normalize;
pub mod output;
pub mod pipeline;

// Re-export commonly used types
pub use config::{Config, DetectionConfig};
pub use detection::RuleDetector;
pub use input::IngestError;
pub use models::{Finding, NormalizedEvent, RawRecord, Severity};
pub use normalize::normalize;
pub use pipeline::{analyze_file, load_and_sequence, run_rules, sequence};
