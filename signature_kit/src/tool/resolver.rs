//! Locating a runnable extraction tool
//!
//! Nothing is downloaded. The tool is either the configured override or a
//! `metalava-<version>.jar` already present in one of the search
//! directories.

use std::path::{Path, PathBuf};

use crate::config::Configuration;
use crate::errors::ToolResolutionError;

/// Environment variable naming an extra directory searched for tool jars
pub const TOOL_HOME_ENV: &str = "SIGGUARD_TOOL_HOME";

/// Per-project tool directory, relative to the project root
pub const LOCAL_TOOLS_DIR: &str = ".sigguard/tools";

/// Program plus the arguments that precede the generated ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    pub program: PathBuf,
    pub leading_args: Vec<String>,
}

impl ResolvedTool {
    /// Run `path` directly
    pub fn direct(path: impl Into<PathBuf>) -> Self {
        Self {
            program: path.into(),
            leading_args: Vec::new(),
        }
    }

    /// Run a jar through the Java launcher
    pub fn jar(jar: &Path) -> Self {
        Self {
            program: java_launcher(),
            leading_args: vec!["-jar".to_string(), jar.display().to_string()],
        }
    }

    /// Jars go through the Java launcher, anything else runs directly
    pub fn for_path(path: &Path) -> Self {
        if is_jar(path) {
            Self::jar(path)
        } else {
            Self::direct(path)
        }
    }

    /// Full argument list: leading arguments, then `args`
    pub fn command_line(&self, args: &[String]) -> Vec<String> {
        let mut all = self.leading_args.clone();
        all.extend_from_slice(args);
        all
    }
}

pub trait ToolResolver: Send + Sync {
    fn resolve(&self, config: &Configuration) -> Result<ResolvedTool, ToolResolutionError>;
}

/// Resolves the override or a locally installed jar
#[derive(Debug, Clone, Default)]
pub struct LocalToolResolver {
    tool_home: Option<PathBuf>,
}

impl LocalToolResolver {
    /// Resolver honouring `SIGGUARD_TOOL_HOME`
    pub fn from_env() -> Self {
        Self {
            tool_home: std::env::var_os(TOOL_HOME_ENV).map(PathBuf::from),
        }
    }

    pub fn with_tool_home(tool_home: impl Into<PathBuf>) -> Self {
        Self {
            tool_home: Some(tool_home.into()),
        }
    }

    fn search_dirs(&self, config: &Configuration) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(home) = &self.tool_home {
            dirs.push(home.clone());
        }
        dirs.push(config.project_root().join(LOCAL_TOOLS_DIR));
        dirs
    }
}

impl ToolResolver for LocalToolResolver {
    fn resolve(&self, config: &Configuration) -> Result<ResolvedTool, ToolResolutionError> {
        if let Some(path) = config.tool_jar_path_override() {
            if !path.is_file() {
                return Err(ToolResolutionError::OverrideMissing(path.to_path_buf()));
            }
            log::debug!("Using tool override {}", path.display());
            return Ok(ResolvedTool::for_path(path));
        }

        let file_name = jar_file_name(config.tool_version());
        let dirs = self.search_dirs(config);
        for dir in &dirs {
            let candidate = dir.join(&file_name);
            if candidate.is_file() {
                log::debug!("Found {} in {}", file_name, dir.display());
                return Ok(ResolvedTool::jar(&candidate));
            }
        }

        Err(ToolResolutionError::NotFound {
            version: config.tool_version().to_string(),
            searched: dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

pub fn jar_file_name(version: &str) -> String {
    format!("metalava-{}.jar", version)
}

fn is_jar(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("jar"))
        .unwrap_or(false)
}

/// `$JAVA_HOME/bin/java` when it exists, otherwise `java` from `PATH`
fn java_launcher() -> PathBuf {
    let binary = if cfg!(windows) { "java.exe" } else { "java" };
    if let Some(home) = std::env::var_os("JAVA_HOME") {
        let candidate = PathBuf::from(home).join("bin").join(binary);
        if candidate.is_file() {
            return candidate;
        }
    }
    PathBuf::from(binary)
}
