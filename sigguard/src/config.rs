//! Configuration types for the sigguard binary
//!
//! A [`RunConfig`] is what the command line asked for. It is turned into the
//! library's validated [`Configuration`] by layering, lowest priority first:
//! compiled defaults, the TOML file, then CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use signature_kit::config::{
    ApiType, Configuration, ConfigurationBuilder, RawConfiguration, SignatureKind,
};
use signature_kit::errors::ConfigurationError;

/// Report format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable console report
    Text,
    /// Machine-readable JSON report
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Operation requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunCommand {
    /// Regenerate the signature file in place
    Generate { kind: Option<SignatureKind> },
    /// Compare freshly generated signatures against the baseline
    Check {
        api_type: Option<ApiType>,
        all: bool,
        no_enforce: bool,
    },
    /// Write keep rules from the existing baseline without running the tool
    KeepRules,
}

impl RunCommand {
    pub fn name(&self) -> &'static str {
        match self {
            RunCommand::Generate { .. } => "generate",
            RunCommand::Check { .. } => "check",
            RunCommand::KeepRules => "keep-rules",
        }
    }
}

/// Configuration for one sigguard invocation
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Project root
    pub root: PathBuf,

    /// Explicit TOML config file (default: `sigguard.toml` in the root)
    pub config_file: Option<PathBuf>,

    /// Tool override, relative to the root
    pub tool: Option<String>,

    pub timeout_secs: Option<u64>,

    pub output_format: OutputFormat,

    /// Report file (None means console-only output)
    pub output_file: Option<PathBuf>,

    /// Suppress console output
    pub quiet: bool,

    pub command: RunCommand,
}

impl RunConfig {
    /// Resolve the library configuration for this invocation
    pub fn configuration(&self) -> Result<Configuration, ConfigurationError> {
        let file = match &self.config_file {
            Some(path) => Some(RawConfiguration::load(path)?),
            None => RawConfiguration::load_project(&self.root)?,
        };
        let mut builder = Configuration::builder();
        if let Some(file) = file {
            builder = file.apply(builder);
        }
        self.apply_overrides(builder).build(&self.root)
    }

    fn apply_overrides(&self, mut builder: ConfigurationBuilder) -> ConfigurationBuilder {
        if let Some(tool) = &self.tool {
            builder = builder.tool_jar_path_override(tool.clone());
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        match &self.command {
            RunCommand::Generate { kind: Some(kind) } => {
                builder = builder.signature_kind(*kind);
            }
            RunCommand::Check {
                api_type,
                no_enforce,
                ..
            } => {
                if let Some(api_type) = api_type {
                    builder = builder.api_type(*api_type);
                }
                if *no_enforce {
                    builder = builder.enforce_check(false);
                }
            }
            _ => {}
        }
        builder
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run_config(root: PathBuf, command: RunCommand) -> RunConfig {
        RunConfig {
            root,
            config_file: None,
            tool: None,
            timeout_secs: None,
            output_format: OutputFormat::Text,
            output_file: None,
            quiet: true,
            command,
        }
    }

    #[test]
    fn test_cli_overrides_project_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("sigguard.toml"),
            "api_type = \"removed\"\nenforce_check = true\ntimeout_secs = 10\n",
        )
        .unwrap();

        let mut run = run_config(
            dir.path().to_path_buf(),
            RunCommand::Check {
                api_type: Some(ApiType::Api),
                all: false,
                no_enforce: true,
            },
        );
        run.timeout_secs = Some(42);
        let config = run.configuration().unwrap();
        assert_eq!(config.api_type(), ApiType::Api);
        assert!(!config.enforce_check());
        assert_eq!(config.timeout(), Duration::from_secs(42));
    }

    #[test]
    fn test_project_file_applies_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("sigguard.toml"), "signature = \"removed\"\n").unwrap();

        let run = run_config(dir.path().to_path_buf(), RunCommand::Generate { kind: None });
        let config = run.configuration().unwrap();
        assert_eq!(config.signature_kind(), SignatureKind::Removed);
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let file = dir.path().join("custom.toml");
        fs::write(&file, "no_such_key = 1\n").unwrap();

        let mut run = run_config(dir.path().to_path_buf(), RunCommand::KeepRules);
        run.config_file = Some(file);
        assert!(matches!(
            run.configuration().unwrap_err(),
            ConfigurationError::Parse { .. }
        ));
    }
}
