//! Rendering of the statistics record on stdout.

use anyhow::{Context, Result};
use clap::ValueEnum;
use tileroute_lib::StatisticsRecord;

/// Output format for the statistics record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One comma-separated line in field order.
    #[default]
    Csv,
    /// One JSON object keyed by field name.
    Json,
}

pub fn render_record(record: &StatisticsRecord, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Csv => Ok(record.to_string()),
        OutputFormat::Json => {
            serde_json::to_string(record).context("failed to serialise statistics record")
        }
    }
}
