//! # sigguard
//!
//! Generates API signature files with metalava and enforces them against the
//! checked-in baseline.
//!
//! ## Usage
//!
//! ```bash
//! # Regenerate api.txt in the current project
//! sigguard generate
//!
//! # Check the public surface against api.txt
//! sigguard check
//!
//! # Check api.txt and removed.txt concurrently, JSON report to a file
//! sigguard --format json -o report.json check --all
//!
//! # Rewrite keep rules from the existing api.txt
//! sigguard keep-rules
//! ```
//!
//! ## Exit Codes
//!
//! - **0**: PASS
//! - **1**: FAIL_DRIFT
//! - **2**: usage, configuration or pipeline error
//! - **3**: FAIL_LINT
//! - **4**: FAIL_TOOL_ERROR
//! - **5**: FAIL_TIMEOUT

mod cli;
mod config;
mod output;
mod runner;

use cli::{parse_args, CliResult};

fn main() {
    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();

    let exit_code = match parse_args(&args) {
        CliResult::Help(text) => {
            print!("{}", text);
            0
        }
        CliResult::Error(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
        CliResult::Run(config) => {
            init_logging(config.quiet);
            match runner::run(&config) {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    2
                }
            }
        }
    };

    std::process::exit(exit_code);
}

/// Initialize `env_logger`; `RUST_LOG` overrides the default filter
fn init_logging(quiet: bool) {
    let default_filter = if quiet { "warn" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .try_init();
}
