//! Output generation module
//!
//! - Console (human-readable, coloured)
//! - Text report file (console layout without colours)
//! - JSON report (run envelope with one object per run)

mod console;
mod summary;

pub use console::{print_footer, print_reports};
pub use summary::build_summary;

use std::time::Duration;

use signature_kit::execution_api::RunReport;

use crate::config::OutputFormat;

/// Build output in the specified format
pub fn build_output(
    command: &str,
    reports: &[RunReport],
    format: OutputFormat,
    duration: Duration,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(console::render(reports, false)),
        OutputFormat::Json => {
            let value = build_summary(command, reports, duration);
            serde_json::to_string_pretty(&value)
                .map_err(|e| OutputError::Serialization(e.to_string()))
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during output generation
#[derive(Debug)]
pub enum OutputError {
    /// Failed to serialize result
    Serialization(String),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Serialization(msg) => write!(f, "Failed to serialize output: {}", msg),
        }
    }
}

impl std::error::Error for OutputError {}
