//! Error types for the signature pipeline.
//!
//! One enum per subsystem. Timeouts and API drift are not errors here: they
//! are reported through [`crate::enforcement::Status`] so the caller always
//! receives a single `Outcome` per run.

use std::path::PathBuf;

/// Configuration rejected before any tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("'{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("unrecognized value '{value}' for '{field}' (expected one of: {expected})")]
    UnknownValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("project root {} does not exist or is not a directory", .0.display())]
    InvalidRoot(PathBuf),

    #[error("source path '{path}' must be a direct child of the project root")]
    NotDirectChild { path: String },

    #[error("source path {} does not exist or is not a directory", .0.display())]
    MissingSourceDirectory(PathBuf),

    #[error("'{field}' path '{path}' escapes the project root")]
    EscapesRoot { field: &'static str, path: String },

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// Signature text that cannot be turned into a `SignatureFile`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedSignatureError {
    #[error("missing signature format header")]
    MissingHeader,

    #[error("unrecognized signature format header: '{0}'")]
    UnknownHeader(String),

    #[error("line {line}: {reason}: '{text}'")]
    Syntax {
        line: usize,
        reason: &'static str,
        text: String,
    },

    #[error("unexpected end of input: {open} unclosed block(s)")]
    UnclosedBlock { open: usize },
}

impl MalformedSignatureError {
    pub(crate) fn syntax(line: usize, reason: &'static str, text: &str) -> Self {
        Self::Syntax {
            line,
            reason,
            text: text.to_string(),
        }
    }
}

/// The extraction tool could not be run at all.
#[derive(Debug, thiserror::Error)]
pub enum ToolExecutionError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait on '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// No runnable extraction tool could be located.
#[derive(Debug, thiserror::Error)]
pub enum ToolResolutionError {
    #[error("tool override {} does not exist", .0.display())]
    OverrideMissing(PathBuf),

    #[error("no metalava {version} jar found (searched: {searched})")]
    NotFound { version: String, searched: String },
}

/// Errors that abort a pipeline run before an `Outcome` can be formed.
///
/// These concern the pipeline's own files (baseline, keep file, generated
/// output directory), never the tool's behaviour.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Tool resolution error: {0}")]
    ToolResolution(#[from] ToolResolutionError),

    #[error("Malformed baseline {}: {source}", .path.display())]
    MalformedBaseline {
        path: PathBuf,
        #[source]
        source: MalformedSignatureError,
    },

    #[error("Run for the {surface} surface panicked")]
    WorkerPanicked { surface: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
