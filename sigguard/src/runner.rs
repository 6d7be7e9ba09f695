//! Core run logic
//!
//! Builds the library configuration, drives the pipeline for the requested
//! command and renders the results.

use std::path::{Path, PathBuf};
use std::time::Instant;

use signature_kit::config::{ApiType, Configuration};
use signature_kit::errors::{ConfigurationError, PipelineError};
use signature_kit::execution_api::{self, RunReport, SignaturePipeline};
use signature_kit::{keep_rules, Status};

use crate::config::{OutputFormat, RunCommand, RunConfig};
use crate::output;

/// Run the command described by `config` and return the process exit code
pub fn run(config: &RunConfig) -> Result<i32, RunError> {
    let start = Instant::now();
    let configuration = config.configuration().map_err(RunError::Configuration)?;

    log::info!(
        "Starting {}: root={} tool_version={}",
        config.command.name(),
        configuration.project_root().display(),
        configuration.tool_version()
    );

    let reports = match &config.command {
        RunCommand::KeepRules => return run_keep_rules(config, &configuration),
        RunCommand::Generate { .. } => {
            let pipeline = SignaturePipeline::system(&configuration, None);
            vec![pipeline.generate(&configuration)?]
        }
        RunCommand::Check { all: false, .. } => {
            let pipeline = SignaturePipeline::system(&configuration, None);
            vec![pipeline.check(&configuration)?]
        }
        RunCommand::Check { all: true, .. } => {
            let pipeline = SignaturePipeline::system(&configuration, None);
            let surfaces = [
                configuration.surface(ApiType::Api),
                configuration.surface(ApiType::Removed),
            ];
            pipeline
                .check_all(&surfaces)
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let duration = start.elapsed();
    let console = !config.quiet;

    match config.output_format {
        OutputFormat::Text if console => {
            output::print_reports(&reports);
            output::print_footer(
                duration,
                config
                    .output_file
                    .as_deref()
                    .map(|path| (path, "text")),
            );
        }
        // JSON goes to stdout unless a report file was requested
        OutputFormat::Json if console && config.output_file.is_none() => {
            let json = output::build_output(
                config.command.name(),
                &reports,
                config.output_format,
                duration,
            )?;
            println!("{}", json);
        }
        _ => {}
    }

    if let Some(path) = &config.output_file {
        save_output(path, config, &reports, duration)?;
    }

    let exit_code = combined_exit_code(&reports);
    log::info!(
        "Finished {}: runs={} exit_code={} duration_ms={}",
        config.command.name(),
        reports.len(),
        exit_code,
        duration.as_millis()
    );
    Ok(exit_code)
}

/// Write keep rules from the existing signature file without invoking the tool
fn run_keep_rules(config: &RunConfig, configuration: &Configuration) -> Result<i32, RunError> {
    if configuration.keep_filename().is_none() {
        return Err(RunError::KeepFileNotConfigured);
    }
    let path = configuration.output_path();
    if !path.is_file() {
        return Err(RunError::MissingSignature(path));
    }

    let signature = execution_api::load_baseline(&path, configuration)?;
    let written = keep_rules::write_keep_file(&signature, configuration)?;
    if !config.quiet {
        if let Some(written) = written {
            println!(
                "Wrote keep rules for {} element(s) to {}",
                signature.len(),
                written.display()
            );
        }
    }
    Ok(0)
}

/// Save the report file in the requested format
fn save_output(
    path: &Path,
    config: &RunConfig,
    reports: &[RunReport],
    duration: std::time::Duration,
) -> Result<(), RunError> {
    let text = output::build_output(
        config.command.name(),
        reports,
        config.output_format,
        duration,
    )?;
    std::fs::write(path, text).map_err(|e| RunError::WriteFile(path.display().to_string(), e))?;
    log::debug!("Report written to {}", path.display());
    Ok(())
}

/// Exit code for several runs: the most severe status wins
///
/// Severity follows the gate order: timeout, lint, tool error, drift.
fn combined_exit_code(reports: &[RunReport]) -> i32 {
    const SEVERITY: [Status; 4] = [
        Status::FailTimeout,
        Status::FailLint,
        Status::FailToolError,
        Status::FailDrift,
    ];
    SEVERITY
        .iter()
        .find(|status| reports.iter().any(|r| r.outcome.status() == **status))
        .map(Status::exit_code)
        .unwrap_or(0)
}

/// Errors that end a run before any report is produced
#[derive(Debug)]
pub enum RunError {
    /// Configuration rejected
    Configuration(ConfigurationError),
    /// Pipeline could not complete
    Pipeline(PipelineError),
    /// Failed to generate output
    Output(output::OutputError),
    /// Failed to write the report file
    WriteFile(String, std::io::Error),
    /// `keep-rules` needs a signature file to read
    MissingSignature(PathBuf),
    /// `keep-rules` without `keep_filename`
    KeepFileNotConfigured,
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Configuration(e) => write!(f, "Invalid configuration: {}", e),
            RunError::Pipeline(e) => write!(f, "{}", e),
            RunError::Output(e) => write!(f, "Output generation failed: {}", e),
            RunError::WriteFile(path, e) => write!(f, "Failed to write {}: {}", path, e),
            RunError::MissingSignature(path) => {
                write!(f, "No signature file at {}", path.display())
            }
            RunError::KeepFileNotConfigured => {
                write!(f, "keep_filename is not configured")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Configuration(e) => Some(e),
            RunError::Pipeline(e) => Some(e),
            RunError::Output(e) => Some(e),
            RunError::WriteFile(_, e) => Some(e),
            RunError::MissingSignature(_) | RunError::KeepFileNotConfigured => None,
        }
    }
}

impl From<PipelineError> for RunError {
    fn from(e: PipelineError) -> Self {
        RunError::Pipeline(e)
    }
}

impl From<output::OutputError> for RunError {
    fn from(e: output::OutputError) -> Self {
        RunError::Output(e)
    }
}
