//! `sigguard.toml` project configuration layer
//!
//! Every key is optional; present keys override the compiled defaults on a
//! [`ConfigurationBuilder`]. Unknown keys are rejected so typos surface as
//! configuration errors instead of silently falling back to defaults.
//!
//! ```toml
//! version = "1.0.0-alpha06"
//! format = "v4"
//! signature = "api"
//! filename = "api.txt"
//! documentation = "protected"
//! source_paths = ["src"]
//! hidden_packages = ["com.example.internal"]
//! keep_filename = "proguard/api-keep.pro"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::options::{ApiType, DocumentationVisibility, Format, JavaSourceLevel, SignatureKind};
use super::ConfigurationBuilder;
use crate::errors::ConfigurationError;

/// Name of the project-level configuration file
pub const CONFIG_FILE_NAME: &str = "sigguard.toml";

/// Raw, all-optional configuration as read from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfiguration {
    pub version: Option<String>,
    pub metalava_jar_path: Option<String>,
    pub java_source_level: Option<JavaSourceLevel>,
    pub format: Option<Format>,
    pub signature: Option<SignatureKind>,
    pub filename: Option<String>,
    pub documentation: Option<DocumentationVisibility>,
    pub api_type: Option<ApiType>,
    pub output_kotlin_nulls: Option<bool>,
    pub output_default_values: Option<bool>,
    pub include_signature_version: Option<bool>,
    pub input_kotlin_nulls: Option<bool>,
    pub report_warnings_as_errors: Option<bool>,
    pub report_lints_as_errors: Option<bool>,
    pub hidden_packages: Option<Vec<String>>,
    pub hidden_annotations: Option<Vec<String>>,
    pub source_paths: Option<Vec<String>>,
    pub enforce_check: Option<bool>,
    pub keep_filename: Option<String>,
    pub generated_dir: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_output_bytes: Option<usize>,
}

impl RawConfiguration {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigurationError> {
        toml::from_str(text).map_err(|e| ConfigurationError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `sigguard.toml` from the project root if present
    pub fn load_project(root: &Path) -> Result<Option<Self>, ConfigurationError> {
        let path: PathBuf = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }
        log::debug!("Loading project configuration from {}", path.display());
        Self::load(&path).map(Some)
    }

    /// Overlay present keys onto `builder`
    pub fn apply(self, mut builder: ConfigurationBuilder) -> ConfigurationBuilder {
        if let Some(v) = self.version {
            builder = builder.tool_version(v);
        }
        if let Some(v) = self.metalava_jar_path {
            builder = builder.tool_jar_path_override(v);
        }
        if let Some(v) = self.java_source_level {
            builder = builder.java_source_level(v);
        }
        if let Some(v) = self.format {
            builder = builder.format(v);
        }
        if let Some(v) = self.signature {
            builder = builder.signature_kind(v);
        }
        if let Some(v) = self.filename {
            builder = builder.output_filename(v);
        }
        if let Some(v) = self.documentation {
            builder = builder.documentation(v);
        }
        if let Some(v) = self.api_type {
            builder = builder.api_type(v);
        }
        if let Some(v) = self.output_kotlin_nulls {
            builder = builder.output_kotlin_nulls(v);
        }
        if let Some(v) = self.output_default_values {
            builder = builder.output_default_values(v);
        }
        if let Some(v) = self.include_signature_version {
            builder = builder.include_signature_version(v);
        }
        if let Some(v) = self.input_kotlin_nulls {
            builder = builder.input_kotlin_nulls(v);
        }
        if let Some(v) = self.report_warnings_as_errors {
            builder = builder.report_warnings_as_errors(v);
        }
        if let Some(v) = self.report_lints_as_errors {
            builder = builder.report_lints_as_errors(v);
        }
        for package in self.hidden_packages.unwrap_or_default() {
            builder = builder.hidden_package(package);
        }
        for annotation in self.hidden_annotations.unwrap_or_default() {
            builder = builder.hidden_annotation(annotation);
        }
        if let Some(v) = self.source_paths {
            builder = builder.source_paths(v);
        }
        if let Some(v) = self.enforce_check {
            builder = builder.enforce_check(v);
        }
        if let Some(v) = self.keep_filename {
            builder = builder.keep_filename(v);
        }
        if let Some(v) = self.generated_dir {
            builder = builder.generated_dir(v);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(v) = self.max_output_bytes {
            builder = builder.max_output_bytes(v);
        }
        builder
    }
}
