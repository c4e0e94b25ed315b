use std::path::{Path, PathBuf};
use structopt::StructOpt;

use authtrail::config::Config;
use authtrail::output::{OutputFormat, OutputHandler};
use authtrail::pipeline::{load_and_sequence, run_rules};

/// Identity-provider audit log analyzer
#[derive(StructOpt, Debug)]
#[structopt(name = "authtrail", about = "Rule-based analysis of identity-provider audit logs")]
pub enum Cli {
    /// Run the detection rules over a log file
    Analyze {
        /// Path to the audit log (overrides the config file)
        #[structopt(short, long)]
        input: Option<PathBuf>,
        /// Path to configuration file
        #[structopt(short, long, default_value = "authtrail.toml")]
        config: PathBuf,
        /// Output format: text, console, json, jsonl
        #[structopt(short, long)]
        format: Option<String>,
        /// Write findings to this file instead of stdout
        #[structopt(short, long)]
        output: Option<PathBuf>,
        /// Maximum number of findings to write
        #[structopt(short, long)]
        limit: Option<usize>,
    },
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "authtrail.toml")]
        output: PathBuf,
    },
    /// Parse and display normalized events from a file
    Parse {
        /// Path to log file
        #[structopt(short, long)]
        file: PathBuf,
        /// Number of events to show
        #[structopt(short, long, default_value = "10")]
        lines: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match Cli::from_args() {
        Cli::Analyze { input, config, format, output, limit } => {
            let mut config = load_config(&config)?;
            if let Some(input) = input {
                config.input.file_path = input;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            if output.is_some() {
                config.output.file_path = output;
            }
            if let Some(limit) = limit {
                config.output.max_findings = limit;
            }
            analyze(&config)?;
        }
        Cli::Config { output } => {
            Config::default().to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Cli::Parse { file, lines } => {
            let events = load_and_sequence(&file)?;
            let display_count = std::cmp::min(lines, events.len());

            println!("Parsed {} event(s) (showing {}):\n", events.len(), display_count);
            for event in events.iter().take(display_count) {
                println!(
                    "  {} {} user={} ip={} country={} outcome={}",
                    event.timestamp_text().as_deref().unwrap_or("-"),
                    event.event_type.as_deref().unwrap_or("-"),
                    event.user.as_deref().unwrap_or("-"),
                    event.ip.as_deref().unwrap_or("-"),
                    event.country.as_deref().unwrap_or("-"),
                    event.outcome.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        let config = Config::from_file(path)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    } else {
        log::warn!("Config file {:?} not found, using defaults", path);
        Ok(Config::default())
    }
}

fn analyze(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let format: OutputFormat = config.output.format.parse()?;

    log::info!("Analyzing {:?}", config.input.file_path);
    let events = load_and_sequence(&config.input.file_path)?;
    let findings = run_rules(&events, config.detection.clone());

    for finding in &findings {
        log::warn!("FINDING: [{}] {} ({})", finding.rule_id, finding.description, finding.severity);
    }

    let shown = &findings[..findings.len().min(config.output.max_findings)];
    let mut output_handler = OutputHandler::new(format, config.output.file_path.clone())?;
    output_handler.write_findings(shown)?;
    output_handler.flush()?;
    Ok(())
}
