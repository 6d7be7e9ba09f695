//! Classification of tool diagnostics
//!
//! Diagnostic lines look like `<location>: <severity>: <message> [<IssueId>]`;
//! the location may be absent (`error: message`). Lines that do not match are
//! ignored.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Lint,
    Warning,
    Error,
}

impl Severity {
    fn marker(&self) -> &'static str {
        match self {
            Severity::Lint => "lint",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    const ALL: [Severity; 3] = [Severity::Lint, Severity::Warning, Severity::Error];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Option<String>,
    pub severity: Severity,
    pub message: String,
    pub issue: Option<String>,
}

impl Diagnostic {
    /// Parse one line; the earliest severity marker on the line wins
    pub fn parse(line: &str) -> Option<Diagnostic> {
        let line = line.trim();
        let (marker, severity) = Severity::ALL
            .into_iter()
            .filter_map(|severity| Marker::find(line, severity).map(|m| (m, severity)))
            .min_by_key(|(marker, _)| marker.start)?;
        let location = marker.located.then(|| line[..marker.start].to_string());
        let (message, issue) = split_issue(&line[marker.end..]);
        Some(Diagnostic {
            location,
            severity,
            message: message.to_string(),
            issue,
        })
    }
}

/// Position of a severity marker within a line
struct Marker {
    start: usize,
    end: usize,
    /// Preceded by a location (`<location>: <severity>: `)
    located: bool,
}

impl Marker {
    fn find(line: &str, severity: Severity) -> Option<Marker> {
        let bare = format!("{}: ", severity.marker());
        if line.starts_with(bare.as_str()) {
            return Some(Marker {
                start: 0,
                end: bare.len(),
                located: false,
            });
        }
        let located = format!(": {}: ", severity.marker());
        line.find(located.as_str()).map(|start| Marker {
            start,
            end: start + located.len(),
            located: true,
        })
    }
}

fn split_issue(rest: &str) -> (&str, Option<String>) {
    let Some(body) = rest.strip_suffix(']') else {
        return (rest, None);
    };
    match body.rfind(" [") {
        Some(index) => {
            let id = &body[index + 2..];
            if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                (body[..index].trim_end(), Some(id.to_string()))
            } else {
                (rest, None)
            }
        }
        None => (rest, None),
    }
}

/// Diagnostics of one run, sorted by which policy switch they fall under
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSummary {
    /// `lint` markers plus `error` lines attributed to lint escalation
    pub lints: Vec<Diagnostic>,
    /// `warning` markers plus `error` lines attributed to warning escalation
    pub warnings: Vec<Diagnostic>,
    /// `error` lines no active switch accounts for
    pub errors: Vec<Diagnostic>,
}

impl DiagnosticSummary {
    /// Classify every diagnostic line in `output`
    ///
    /// The escalation switches are forwarded to the tool, which then reports
    /// escalated issues as `error`. An `error` carrying an issue id is
    /// therefore attributed to an active switch, lints first.
    pub fn classify(output: &str, lints_as_errors: bool, warnings_as_errors: bool) -> Self {
        let mut summary = DiagnosticSummary::default();
        for diagnostic in output.lines().filter_map(Diagnostic::parse) {
            match diagnostic.severity {
                Severity::Lint => summary.lints.push(diagnostic),
                Severity::Warning => summary.warnings.push(diagnostic),
                Severity::Error if diagnostic.issue.is_some() && lints_as_errors => {
                    summary.lints.push(diagnostic)
                }
                Severity::Error if diagnostic.issue.is_some() && warnings_as_errors => {
                    summary.warnings.push(diagnostic)
                }
                Severity::Error => summary.errors.push(diagnostic),
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.lints.is_empty() && self.warnings.is_empty() && self.errors.is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_located_line() {
        let d = Diagnostic::parse(
            "src/foo/Bar.java:12: lint: Missing nullability on method `baz` [MissingNullability]",
        )
        .unwrap();
        assert_eq!(d.location.as_deref(), Some("src/foo/Bar.java:12"));
        assert_eq!(d.severity, Severity::Lint);
        assert_eq!(d.message, "Missing nullability on method `baz`");
        assert_eq!(d.issue.as_deref(), Some("MissingNullability"));
    }

    #[test]
    fn test_parse_takes_first_marker_on_line() {
        let d = Diagnostic::parse("a.kt:1: error: bad: warning: x").unwrap();
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.location.as_deref(), Some("a.kt:1"));
        assert_eq!(d.message, "bad: warning: x");

        let d = Diagnostic::parse("warning: see a.kt:1: error: x").unwrap();
        assert_eq!(d.severity, Severity::Warning);
        assert!(d.location.is_none());
    }

    #[test]
    fn test_parse_bare_error() {
        let d = Diagnostic::parse("error: Aborting: no sources found").unwrap();
        assert!(d.location.is_none());
        assert_eq!(d.severity, Severity::Error);
        assert!(d.issue.is_none());
    }

    #[test]
    fn test_non_diagnostic_lines_ignored() {
        assert!(Diagnostic::parse("Writing api.txt").is_none());
        assert!(Diagnostic::parse("").is_none());
    }

    #[test]
    fn test_escalated_errors_attributed_to_switches() {
        let output = "a.kt:1: error: Bad name [AcronymName]\nb.kt:2: warning: Hidden type [HiddenTypeParameter]\nerror: crashed\n";

        let plain = DiagnosticSummary::classify(output, false, false);
        assert_eq!(plain.errors.len(), 2);
        assert_eq!(plain.warnings.len(), 1);

        let lints = DiagnosticSummary::classify(output, true, true);
        assert_eq!(lints.lints.len(), 1);
        assert_eq!(lints.warnings.len(), 1);
        assert_eq!(lints.errors.len(), 1);

        let warnings = DiagnosticSummary::classify(output, false, true);
        assert_eq!(warnings.lints.len(), 0);
        assert_eq!(warnings.warnings.len(), 2);
    }
}
