//! Console output formatting
//!
//! Renders run reports in a human-readable format. The same renderer backs
//! console printing (with ANSI colours) and `--format text` report files
//! (without).

use std::fmt::Write;

use signature_kit::execution_api::RunReport;
use signature_kit::Status;

const RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────";

/// Print run reports to the console
pub fn print_reports(reports: &[RunReport]) {
    print!("{}", render(reports, true));
}

/// Render run reports as text
pub fn render(reports: &[RunReport], colour: bool) -> String {
    let mut out = String::new();
    for report in reports {
        render_report(&mut out, report, colour);
    }
    out
}

fn render_report(out: &mut String, report: &RunReport, colour: bool) {
    let status = report.outcome.status();
    let (icon, code) = if status.is_pass() {
        ("✓", "\x1b[32m")
    } else {
        ("✗", "\x1b[31m")
    };
    let (code, reset) = if colour { (code, "\x1b[0m") } else { ("", "") };

    let _ = write!(
        out,
        "[{} {}] {}{} {}{}",
        report.operation,
        report.kind,
        code,
        icon,
        status,
        reset
    );
    match report.element_count {
        Some(count) => {
            let _ = writeln!(
                out,
                "  ({} elements, {:.2}s)",
                count,
                report.duration.as_secs_f64()
            );
        }
        None => {
            let _ = writeln!(out, "  ({:.2}s)", report.duration.as_secs_f64());
        }
    }

    for message in report.outcome.messages() {
        for line in message.lines() {
            let _ = writeln!(out, "  {}", line);
        }
    }

    // Drift lines are already part of the messages on FAIL_DRIFT
    if status != Status::FailDrift {
        for line in report.outcome.report_lines() {
            let _ = writeln!(out, "  {}", line);
        }
    }

    if let Some(path) = &report.keep_path {
        let _ = writeln!(out, "  Keep rules:   {}", path.display());
    }
    out.push('\n');
}

/// Print the duration footer
pub fn print_footer(duration: std::time::Duration, report_file: Option<(&std::path::Path, &str)>) {
    println!("{}", RULE);
    println!("  Duration:     {:.2}s", duration.as_secs_f64());
    if let Some((path, format)) = report_file {
        println!("  Output:       {} ({})", path.display(), format);
    }
    println!("{}", RULE);
    println!();
}
