//! Pipeline configuration
//!
//! A [`Configuration`] is built once per run through [`ConfigurationBuilder`]:
//! every default is applied up front and every invariant is checked by
//! [`ConfigurationBuilder::build`]. Nothing downstream re-validates.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied by the binary onto the builder)
//! 2. Project config (`sigguard.toml` in the project root, see [`file`])
//! 3. Compiled defaults

pub mod file;
pub mod options;

pub use file::{RawConfiguration, CONFIG_FILE_NAME};
pub use options::{ApiType, DocumentationVisibility, Format, JavaSourceLevel, SignatureKind};

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigurationError;
use crate::signature::ParseOptions;

pub const DEFAULT_TOOL_VERSION: &str = "1.0.0-alpha06";
pub const DEFAULT_OUTPUT_FILENAME: &str = "api.txt";
pub const DEFAULT_SOURCE_PATH: &str = "src";
pub const REMOVED_FILENAME: &str = "removed.txt";
pub const DEFAULT_GENERATED_DIR: &str = "build/sigguard";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Fully resolved, validated configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    project_root: PathBuf,
    tool_version: String,
    tool_jar_path_override: Option<PathBuf>,
    java_source_level: JavaSourceLevel,
    format: Format,
    signature_kind: SignatureKind,
    output_filename: String,
    output_override: Option<PathBuf>,
    documentation: DocumentationVisibility,
    api_type: ApiType,
    output_kotlin_nulls: bool,
    output_default_values: bool,
    include_signature_version: bool,
    input_kotlin_nulls: bool,
    report_warnings_as_errors: bool,
    report_lints_as_errors: bool,
    hidden_packages: BTreeSet<String>,
    hidden_annotations: BTreeSet<String>,
    source_paths: Vec<PathBuf>,
    enforce_check: bool,
    keep_filename: Option<String>,
    generated_dir: PathBuf,
    timeout: Duration,
    max_output_bytes: usize,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }

    pub fn tool_jar_path_override(&self) -> Option<&Path> {
        self.tool_jar_path_override.as_deref()
    }

    pub fn java_source_level(&self) -> JavaSourceLevel {
        self.java_source_level
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn signature_kind(&self) -> SignatureKind {
        self.signature_kind
    }

    pub fn output_filename(&self) -> &str {
        &self.output_filename
    }

    pub fn documentation(&self) -> DocumentationVisibility {
        self.documentation
    }

    pub fn api_type(&self) -> ApiType {
        self.api_type
    }

    pub fn output_kotlin_nulls(&self) -> bool {
        self.output_kotlin_nulls
    }

    pub fn output_default_values(&self) -> bool {
        self.output_default_values
    }

    pub fn include_signature_version(&self) -> bool {
        self.include_signature_version
    }

    pub fn input_kotlin_nulls(&self) -> bool {
        self.input_kotlin_nulls
    }

    pub fn report_warnings_as_errors(&self) -> bool {
        self.report_warnings_as_errors
    }

    pub fn report_lints_as_errors(&self) -> bool {
        self.report_lints_as_errors
    }

    pub fn hidden_packages(&self) -> &BTreeSet<String> {
        &self.hidden_packages
    }

    pub fn hidden_annotations(&self) -> &BTreeSet<String> {
        &self.hidden_annotations
    }

    /// Resolved source directories in declared order
    pub fn source_paths(&self) -> &[PathBuf] {
        &self.source_paths
    }

    pub fn enforce_check(&self) -> bool {
        self.enforce_check
    }

    pub fn keep_filename(&self) -> Option<&str> {
        self.keep_filename.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    /// Where the tool writes the signature file for this configuration
    pub fn output_path(&self) -> PathBuf {
        match &self.output_override {
            Some(path) => path.clone(),
            None => self.project_root.join(&self.output_filename),
        }
    }

    /// The accepted baseline for this configuration's `output_filename`
    pub fn baseline_path(&self) -> PathBuf {
        self.project_root.join(&self.output_filename)
    }

    pub fn keep_path(&self) -> Option<PathBuf> {
        self.keep_filename
            .as_ref()
            .map(|name| self.project_root.join(name))
    }

    /// Private output location for a run of the given kind
    ///
    /// Each kind gets its own directory so concurrent runs never share a path.
    pub fn generated_output_path(&self, kind: SignatureKind) -> PathBuf {
        let file_name = Path::new(&self.output_filename)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILENAME));
        self.generated_dir.join(kind.as_str()).join(file_name)
    }

    /// Copy of this configuration writing `kind` to `output`
    pub fn retarget(&self, kind: SignatureKind, output: PathBuf) -> Configuration {
        Configuration {
            signature_kind: kind,
            output_override: Some(output),
            ..self.clone()
        }
    }

    /// Configuration checking one surface
    ///
    /// The removed surface is compared against `removed.txt` next to the
    /// configured `output_filename`.
    pub fn surface(&self, api_type: ApiType) -> Configuration {
        let output_filename = match api_type {
            ApiType::Api => self.output_filename.clone(),
            ApiType::Removed => {
                let sibling = Path::new(&self.output_filename).with_file_name(REMOVED_FILENAME);
                sibling.to_string_lossy().into_owned()
            }
        };
        Configuration {
            api_type,
            output_filename,
            ..self.clone()
        }
    }

    /// How signature files produced under this configuration are read back.
    ///
    /// With `input_kotlin_nulls` on, the Kotlin null encoding is assumed
    /// regardless of `output_kotlin_nulls`.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            kotlin_nulls: self.input_kotlin_nulls || self.output_kotlin_nulls,
            require_header: self.include_signature_version
                && self.format.header_version().is_some(),
        }
    }
}

/// Builder applying compiled defaults before validation
#[derive(Debug, Clone)]
pub struct ConfigurationBuilder {
    tool_version: String,
    tool_jar_path_override: Option<String>,
    java_source_level: JavaSourceLevel,
    format: Format,
    signature_kind: SignatureKind,
    output_filename: String,
    documentation: DocumentationVisibility,
    api_type: ApiType,
    output_kotlin_nulls: bool,
    output_default_values: bool,
    include_signature_version: bool,
    input_kotlin_nulls: bool,
    report_warnings_as_errors: bool,
    report_lints_as_errors: bool,
    hidden_packages: Vec<String>,
    hidden_annotations: Vec<String>,
    source_paths: Vec<String>,
    enforce_check: bool,
    keep_filename: Option<String>,
    generated_dir: String,
    timeout: Duration,
    max_output_bytes: usize,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            tool_version: DEFAULT_TOOL_VERSION.to_string(),
            tool_jar_path_override: None,
            java_source_level: JavaSourceLevel::Java11,
            format: Format::V4,
            signature_kind: SignatureKind::Api,
            output_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
            documentation: DocumentationVisibility::Protected,
            api_type: ApiType::Api,
            output_kotlin_nulls: true,
            output_default_values: true,
            include_signature_version: true,
            input_kotlin_nulls: false,
            report_warnings_as_errors: false,
            report_lints_as_errors: false,
            hidden_packages: Vec::new(),
            hidden_annotations: Vec::new(),
            source_paths: vec![DEFAULT_SOURCE_PATH.to_string()],
            enforce_check: true,
            keep_filename: None,
            generated_dir: DEFAULT_GENERATED_DIR.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl ConfigurationBuilder {
    pub fn tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = version.into();
        self
    }

    pub fn tool_jar_path_override(mut self, path: impl Into<String>) -> Self {
        self.tool_jar_path_override = Some(path.into());
        self
    }

    pub fn java_source_level(mut self, level: JavaSourceLevel) -> Self {
        self.java_source_level = level;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn signature_kind(mut self, kind: SignatureKind) -> Self {
        self.signature_kind = kind;
        self
    }

    pub fn output_filename(mut self, filename: impl Into<String>) -> Self {
        self.output_filename = filename.into();
        self
    }

    pub fn documentation(mut self, documentation: DocumentationVisibility) -> Self {
        self.documentation = documentation;
        self
    }

    pub fn api_type(mut self, api_type: ApiType) -> Self {
        self.api_type = api_type;
        self
    }

    pub fn output_kotlin_nulls(mut self, enabled: bool) -> Self {
        self.output_kotlin_nulls = enabled;
        self
    }

    pub fn output_default_values(mut self, enabled: bool) -> Self {
        self.output_default_values = enabled;
        self
    }

    pub fn include_signature_version(mut self, enabled: bool) -> Self {
        self.include_signature_version = enabled;
        self
    }

    pub fn input_kotlin_nulls(mut self, enabled: bool) -> Self {
        self.input_kotlin_nulls = enabled;
        self
    }

    pub fn report_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.report_warnings_as_errors = enabled;
        self
    }

    pub fn report_lints_as_errors(mut self, enabled: bool) -> Self {
        self.report_lints_as_errors = enabled;
        self
    }

    pub fn hidden_package(mut self, package: impl Into<String>) -> Self {
        self.hidden_packages.push(package.into());
        self
    }

    pub fn hidden_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.hidden_annotations.push(annotation.into());
        self
    }

    /// Replace the source paths (default `["src"]`)
    pub fn source_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn enforce_check(mut self, enabled: bool) -> Self {
        self.enforce_check = enabled;
        self
    }

    pub fn keep_filename(mut self, filename: impl Into<String>) -> Self {
        self.keep_filename = Some(filename.into());
        self
    }

    pub fn generated_dir(mut self, dir: impl Into<String>) -> Self {
        self.generated_dir = dir.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Validate against `project_root` and produce the immutable configuration
    pub fn build(self, project_root: &Path) -> Result<Configuration, ConfigurationError> {
        if !project_root.is_dir() {
            return Err(ConfigurationError::InvalidRoot(project_root.to_path_buf()));
        }
        let root = project_root
            .canonicalize()
            .map_err(|_| ConfigurationError::InvalidRoot(project_root.to_path_buf()))?;

        require_non_empty("tool_version", &self.tool_version)?;
        require_non_empty("filename", &self.output_filename)?;
        require_inside_root("filename", &self.output_filename)?;
        require_non_empty("generated_dir", &self.generated_dir)?;
        require_inside_root("generated_dir", &self.generated_dir)?;

        if let Some(keep) = &self.keep_filename {
            require_non_empty("keep_filename", keep)?;
            require_inside_root("keep_filename", keep)?;
        }

        let tool_jar_path_override = match self.tool_jar_path_override {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(root.join(path)),
            None => None,
        };

        let hidden_packages = collect_names("hidden_packages", self.hidden_packages)?;
        let hidden_annotations = collect_names("hidden_annotations", self.hidden_annotations)?;

        let mut source_paths: Vec<PathBuf> = Vec::with_capacity(self.source_paths.len());
        for entry in &self.source_paths {
            let resolved = resolve_source_path(&root, entry)?;
            if !source_paths.contains(&resolved) {
                source_paths.push(resolved);
            }
        }

        let generated_dir = root.join(&self.generated_dir);

        if self.input_kotlin_nulls && !self.output_kotlin_nulls {
            log::debug!(
                "input_kotlin_nulls is set; output_kotlin_nulls=false is ignored when reading signatures back"
            );
        }

        Ok(Configuration {
            project_root: root,
            tool_version: self.tool_version,
            tool_jar_path_override,
            java_source_level: self.java_source_level,
            format: self.format,
            signature_kind: self.signature_kind,
            output_filename: self.output_filename,
            output_override: None,
            documentation: self.documentation,
            api_type: self.api_type,
            output_kotlin_nulls: self.output_kotlin_nulls,
            output_default_values: self.output_default_values,
            include_signature_version: self.include_signature_version,
            input_kotlin_nulls: self.input_kotlin_nulls,
            report_warnings_as_errors: self.report_warnings_as_errors,
            report_lints_as_errors: self.report_lints_as_errors,
            hidden_packages,
            hidden_annotations,
            source_paths,
            enforce_check: self.enforce_check,
            keep_filename: self.keep_filename,
            generated_dir,
            timeout: self.timeout,
            max_output_bytes: self.max_output_bytes,
        })
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ConfigurationError> {
    if value.trim().is_empty() {
        return Err(ConfigurationError::EmptyField { field });
    }
    Ok(())
}

/// Relative path with no `..` components
fn require_inside_root(field: &'static str, value: &str) -> Result<(), ConfigurationError> {
    let path = Path::new(value);
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ConfigurationError::EscapesRoot {
            field,
            path: value.to_string(),
        });
    }
    Ok(())
}

fn collect_names(
    field: &'static str,
    names: Vec<String>,
) -> Result<BTreeSet<String>, ConfigurationError> {
    let mut set = BTreeSet::new();
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ConfigurationError::EmptyField { field });
        }
        set.insert(trimmed.to_string());
    }
    Ok(set)
}

/// Resolve a source path entry that must name a direct child directory of `root`
fn resolve_source_path(root: &Path, entry: &str) -> Result<PathBuf, ConfigurationError> {
    let trimmed = entry.trim();
    if trimmed.is_empty() {
        return Err(ConfigurationError::EmptyField {
            field: "source_paths",
        });
    }

    let candidate = Path::new(trimmed);
    let resolved = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        let normal: Vec<_> = candidate
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        match normal.as_slice() {
            [Component::Normal(name)] => root.join(name),
            _ => {
                return Err(ConfigurationError::NotDirectChild {
                    path: trimmed.to_string(),
                })
            }
        }
    };

    if !resolved.is_dir() {
        return Err(ConfigurationError::MissingSourceDirectory(resolved));
    }

    let canonical = resolved
        .canonicalize()
        .map_err(|_| ConfigurationError::MissingSourceDirectory(resolved.clone()))?;
    if canonical.parent() != Some(root) {
        return Err(ConfigurationError::NotDirectChild {
            path: trimmed.to_string(),
        });
    }

    Ok(canonical)
}
