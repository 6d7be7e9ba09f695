//! Terminal result of a pipeline run

use std::fmt;

use serde::Serialize;

use crate::signature::DiffResult;

/// Final status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pass,
    FailDrift,
    FailLint,
    FailToolError,
    FailTimeout,
}

impl Status {
    /// Process exit code; every failure has its own
    pub fn exit_code(&self) -> i32 {
        match self {
            Status::Pass => 0,
            Status::FailDrift => 1,
            Status::FailLint => 3,
            Status::FailToolError => 4,
            Status::FailTimeout => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::FailDrift => "FAIL_DRIFT",
            Status::FailLint => "FAIL_LINT",
            Status::FailToolError => "FAIL_TOOL_ERROR",
            Status::FailTimeout => "FAIL_TIMEOUT",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Status::Pass)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status, optional diff and ordered messages of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    status: Status,
    diff: Option<DiffResult>,
    messages: Vec<String>,
}

impl Outcome {
    pub(crate) fn new(status: Status, diff: Option<DiffResult>, messages: Vec<String>) -> Self {
        Self {
            status,
            diff,
            messages,
        }
    }

    pub(crate) fn failure(status: Status, messages: Vec<String>) -> Self {
        Self::new(status, None, messages)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn diff(&self) -> Option<&DiffResult> {
        self.diff.as_ref()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_pass(&self) -> bool {
        self.status.is_pass()
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }

    /// Sorted drift report lines, empty when there is no diff
    pub fn report_lines(&self) -> Vec<String> {
        self.diff
            .as_ref()
            .map(DiffResult::report_lines)
            .unwrap_or_default()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exit_codes_are_distinct() {
        let all = [
            Status::Pass,
            Status::FailDrift,
            Status::FailLint,
            Status::FailToolError,
            Status::FailTimeout,
        ];
        let codes: HashSet<i32> = all.iter().map(Status::exit_code).collect();
        assert_eq!(codes.len(), all.len());
        assert_eq!(Status::Pass.exit_code(), 0);
        assert!(all[1..].iter().all(|s| s.exit_code() != 0));
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&Status::FailToolError).unwrap();
        assert_eq!(json, "\"FAIL_TOOL_ERROR\"");
    }
}
