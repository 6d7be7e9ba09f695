//! Enforcement gate
//!
//! Policy is applied once, here, after the tool has run and its output has
//! been diffed. Checks run in a fixed order: timeout, escalated lints,
//! escalated warnings, unexplained tool failure, `enforce_check`, drift.

pub mod diagnostics;
pub mod outcome;

pub use diagnostics::{Diagnostic, DiagnosticSummary, Severity};
pub use outcome::{Outcome, Status};

use crate::config::Configuration;
use crate::signature::DiffResult;
use crate::tool::ExecutionResult;

/// Final verdict for one run
pub fn evaluate(
    diff: Option<DiffResult>,
    execution: &ExecutionResult,
    config: &Configuration,
) -> Outcome {
    if let Some(failure) = execution_failure(execution, config) {
        return failure;
    }

    let Some(diff) = diff else {
        return Outcome::new(Status::Pass, None, Vec::new());
    };

    if !config.enforce_check() {
        let mut messages = Vec::new();
        if !diff.is_empty() {
            messages.push(format!(
                "{} API change(s) not enforced (enforce_check=false)",
                diff.len()
            ));
        }
        return Outcome::new(Status::Pass, Some(diff), messages);
    }

    if diff.is_empty() {
        return Outcome::new(Status::Pass, Some(diff), Vec::new());
    }

    let mut messages = vec![format!(
        "API surface differs from baseline {}: {} change(s)",
        config.baseline_path().display(),
        diff.len()
    )];
    messages.extend(diff.report_lines());
    Outcome::new(Status::FailDrift, Some(diff), messages)
}

/// Failure decided by the execution alone, before any output is parsed
///
/// Returns `None` when the run may proceed to parsing and diffing.
pub fn execution_failure(execution: &ExecutionResult, config: &Configuration) -> Option<Outcome> {
    if execution.timed_out {
        let headline = if execution.cancelled {
            "Run cancelled; tool process terminated".to_string()
        } else {
            format!(
                "Tool did not finish within {}s and was terminated",
                config.timeout().as_secs()
            )
        };
        return Some(Outcome::failure(
            Status::FailTimeout,
            with_stderr(headline, execution),
        ));
    }

    // Diagnostics go to stderr; stdout may echo source text
    let summary = DiagnosticSummary::classify(
        &execution.stderr,
        config.report_lints_as_errors(),
        config.report_warnings_as_errors(),
    );

    if config.report_lints_as_errors() && !summary.lints.is_empty() {
        return Some(Outcome::failure(
            Status::FailLint,
            with_stderr(
                format!("{} lint issue(s) reported as errors", summary.lints.len()),
                execution,
            ),
        ));
    }
    if config.report_warnings_as_errors() && !summary.warnings.is_empty() {
        return Some(Outcome::failure(
            Status::FailLint,
            with_stderr(
                format!("{} warning(s) reported as errors", summary.warnings.len()),
                execution,
            ),
        ));
    }

    if execution.exit_code != 0 {
        let explained = summary.errors.is_empty()
            && (!summary.lints.is_empty() || !summary.warnings.is_empty());
        if explained {
            log::warn!(
                "Tool exited with {} on tolerated diagnostics: lints={} warnings={}",
                execution.exit_code,
                summary.lints.len(),
                summary.warnings.len()
            );
        } else {
            return Some(Outcome::failure(
                Status::FailToolError,
                with_stderr(
                    format!("Tool failed with exit code {}", execution.exit_code),
                    execution,
                ),
            ));
        }
    } else if !summary.lints.is_empty() || !summary.warnings.is_empty() {
        log::info!(
            "Tool reported lints={} warnings={}",
            summary.lints.len(),
            summary.warnings.len()
        );
    }

    None
}

/// Headline followed by the captured stderr, verbatim
fn with_stderr(headline: String, execution: &ExecutionResult) -> Vec<String> {
    let mut messages = vec![headline];
    let stderr = execution.stderr.trim_end();
    if !stderr.is_empty() {
        messages.push(stderr.to_string());
    }
    messages
}
