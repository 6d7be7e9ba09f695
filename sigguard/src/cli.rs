//! Command-line interface parsing
//!
//! Handles argument parsing and validation. Help and version text come from
//! clap and are returned to `main` for printing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use signature_kit::config::{ApiType, SignatureKind};

use crate::config::{OutputFormat, RunCommand, RunConfig};

/// CLI parsing result
pub enum CliResult {
    /// Run with this configuration
    Run(RunConfig),
    /// Help or version text; print and exit successfully
    Help(String),
    /// Error with message
    Error(String),
}

#[derive(Debug, Parser)]
#[command(
    name = "sigguard",
    version,
    about = "Generate, check and enforce API signature files",
    after_help = "EXIT CODES:\n    0    PASS\n    1    FAIL_DRIFT\n    2    Usage, configuration or pipeline error\n    3    FAIL_LINT\n    4    FAIL_TOOL_ERROR\n    5    FAIL_TIMEOUT"
)]
struct Cli {
    /// Project root
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (default: sigguard.toml in the project root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Extraction tool to run instead of a located jar, relative to the root
    #[arg(long, global = true)]
    tool: Option<String>,

    /// Kill the tool after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Report format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also write the report to this file
    #[arg(short = 'o', long, global = true)]
    output: Option<PathBuf>,

    /// Suppress console output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Regenerate the signature file in place
    Generate {
        /// Which signature file to write (api, removed)
        #[arg(long, value_parser = parse_kind)]
        kind: Option<SignatureKind>,
    },
    /// Compare the current API surface with the checked-in baseline
    Check {
        /// Surface to check (api, removed)
        #[arg(long, value_parser = parse_api_type, conflicts_with = "all")]
        api_type: Option<ApiType>,

        /// Check the api and removed surfaces concurrently
        #[arg(long)]
        all: bool,

        /// Report drift without failing
        #[arg(long)]
        no_enforce: bool,
    },
    /// Write keep rules from the existing signature file
    KeepRules,
}

fn parse_kind(value: &str) -> Result<SignatureKind, String> {
    value.parse().map_err(|e: signature_kit::errors::ConfigurationError| e.to_string())
}

fn parse_api_type(value: &str) -> Result<ApiType, String> {
    value.parse().map_err(|e: signature_kit::errors::ConfigurationError| e.to_string())
}

/// Parse command-line arguments
pub fn parse_args(args: &[String]) -> CliResult {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            return match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    CliResult::Help(e.to_string())
                }
                _ => CliResult::Error(e.to_string().trim_end().to_string()),
            };
        }
    };

    if !cli.root.is_dir() {
        return CliResult::Error(format!("Path not found: {}", cli.root.display()));
    }

    let command = match cli.command {
        Command::Generate { kind } => RunCommand::Generate { kind },
        Command::Check {
            api_type,
            all,
            no_enforce,
        } => RunCommand::Check {
            api_type,
            all,
            no_enforce,
        },
        Command::KeepRules => RunCommand::KeepRules,
    };

    CliResult::Run(RunConfig {
        root: cli.root,
        config_file: cli.config,
        tool: cli.tool,
        timeout_secs: cli.timeout_secs,
        output_format: cli.format,
        output_file: cli.output,
        quiet: cli.quiet,
        command,
    })
}
