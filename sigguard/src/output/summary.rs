//! JSON report builder
//!
//! One envelope per invocation with a run id, timestamp and one object per
//! pipeline run.

use std::time::Duration;

use signature_kit::execution_api::RunReport;

/// Build the JSON report for all runs of one invocation
pub fn build_summary(command: &str, reports: &[RunReport], duration: Duration) -> serde_json::Value {
    let passed = reports.iter().filter(|r| r.outcome.is_pass()).count();
    let runs: Vec<serde_json::Value> = reports.iter().map(build_run).collect();

    serde_json::json!({
        "tool": {
            "name": "sigguard",
            "version": env!("CARGO_PKG_VERSION")
        },
        "run_id": uuid::Uuid::new_v4().to_string(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "command": command,
        "duration_ms": duration.as_millis() as u64,
        "summary": {
            "total_runs": reports.len(),
            "passed": passed,
            "failed": reports.len() - passed
        },
        "runs": runs
    })
}

/// Build the object for a single run
fn build_run(report: &RunReport) -> serde_json::Value {
    let (added, removed, changed) = report
        .outcome
        .diff()
        .map(|d| (d.added.len(), d.removed.len(), d.changed.len()))
        .unwrap_or((0, 0, 0));

    serde_json::json!({
        "operation": report.operation.as_str(),
        "kind": report.kind,
        "status": report.outcome.status(),
        "exit_code": report.outcome.exit_code(),
        "tool_exit_code": report.exit_code,
        "fingerprint": report.fingerprint,
        "output_path": report.output_path.display().to_string(),
        "baseline_path": report.baseline_path.as_ref().map(|p| p.display().to_string()),
        "keep_path": report.keep_path.as_ref().map(|p| p.display().to_string()),
        "element_count": report.element_count,
        "counts": {
            "added": added,
            "removed": removed,
            "changed": changed
        },
        "report_lines": report.outcome.report_lines(),
        "messages": report.outcome.messages(),
        "duration_ms": report.duration.as_millis() as u64
    })
}
