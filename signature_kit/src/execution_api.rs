//! # Pipeline API
//!
//! High-level entry points for generating and checking signature files.
//!
//! A run goes: resolve tool → build arguments → invoke → parse → diff →
//! gate. Callers only need a validated [`Configuration`] and a
//! [`SignaturePipeline`]:
//!
//! ```ignore
//! use signature_kit::config::Configuration;
//! use signature_kit::execution_api::SignaturePipeline;
//!
//! let config = Configuration::builder().build(project_root)?;
//! let pipeline = SignaturePipeline::system(&config, None);
//! let report = pipeline.check(&config)?;
//! if !report.outcome.is_pass() {
//!     for line in report.outcome.messages() {
//!         eprintln!("{}", line);
//!     }
//! }
//! std::process::exit(report.outcome.exit_code());
//! ```

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::config::{Configuration, SignatureKind};
use crate::enforcement::{self, Outcome, Status};
use crate::errors::PipelineError;
use crate::keep_rules;
use crate::signature::{self, SignatureFile};
use crate::tool::{
    arguments, Cancellable, CancellationToken, ExecutionResult, LocalToolResolver,
    SystemToolExecutor, ToolExecutor, ToolResolver,
};

// ============================================================================
// Report types
// ============================================================================

/// Which pipeline operation produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Generate,
    Check,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Generate => "generate",
            Operation::Check => "check",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything known about one finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub operation: Operation,
    pub kind: SignatureKind,
    pub outcome: Outcome,
    /// SHA-256 over the program and its full argument list
    pub fingerprint: String,
    /// Where the tool was asked to write its signature file
    pub output_path: PathBuf,
    /// Baseline compared against (check only)
    pub baseline_path: Option<PathBuf>,
    /// Keep file written (generate only)
    pub keep_path: Option<PathBuf>,
    /// Elements in the freshly generated signature, when it parsed
    pub element_count: Option<usize>,
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Drives the extraction tool through a resolver and an executor
///
/// Both collaborators are trait objects so tests can substitute scripted
/// implementations. The pipeline holds no mutable state; one instance can
/// serve concurrent runs.
#[derive(Clone)]
pub struct SignaturePipeline {
    resolver: Arc<dyn ToolResolver>,
    executor: Arc<dyn ToolExecutor>,
    cancellation: Option<CancellationToken>,
}

impl SignaturePipeline {
    pub fn new(resolver: Arc<dyn ToolResolver>, executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            resolver,
            executor,
            cancellation: None,
        }
    }

    /// Pipeline using the local resolver and a process executor limited by
    /// `config`'s output cap, running in the project root
    pub fn system(config: &Configuration, cancellation: Option<CancellationToken>) -> Self {
        let mut executor = SystemToolExecutor::new(config.max_output_bytes())
            .with_working_dir(config.project_root());
        if let Some(token) = &cancellation {
            executor = executor.with_cancellation(token.clone());
        }
        Self {
            resolver: Arc::new(LocalToolResolver::from_env()),
            executor: Arc::new(executor),
            cancellation,
        }
    }

    /// Runs observe `token`; a set token ends them with `FAIL_TIMEOUT`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Generate the configured signature file in place
    ///
    /// The tool writes `output_filename` under the project root; the result
    /// is parsed to validate it and keep rules are written when configured.
    /// No baseline is involved, so the outcome is never `FAIL_DRIFT`.
    pub fn generate(&self, config: &Configuration) -> Result<RunReport, PipelineError> {
        self.run(Operation::Generate, config)
    }

    /// Check the surface selected by `api_type` against its baseline
    ///
    /// The baseline is the one [`Configuration::surface`] selects, so the
    /// removed surface is always compared against `removed.txt`. The tool
    /// writes into the private generated directory for that surface; the
    /// baseline file is only read. A missing baseline counts as empty.
    pub fn check(&self, config: &Configuration) -> Result<RunReport, PipelineError> {
        let surface = config.surface(config.api_type());
        let kind = surface.api_type().signature_kind();
        let run_config = surface.retarget(kind, surface.generated_output_path(kind));
        self.run(Operation::Check, &run_config)
    }

    /// Check several independent configurations concurrently
    ///
    /// At most one run per CPU is in flight. Results come back in input order.
    pub fn check_all(&self, configs: &[Configuration]) -> Vec<Result<RunReport, PipelineError>> {
        let workers = num_cpus::get().max(1);
        log::debug!(
            "Checking {} surface(s) with up to {} worker(s)",
            configs.len(),
            workers
        );

        let mut results = Vec::with_capacity(configs.len());
        for chunk in configs.chunks(workers) {
            let chunk_results: Vec<_> = std::thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|config| (config, scope.spawn(move || self.check(config))))
                    .collect();
                handles
                    .into_iter()
                    .map(|(config, handle)| {
                        handle.join().unwrap_or_else(|_| {
                            Err(PipelineError::WorkerPanicked {
                                surface: config.api_type().to_string(),
                            })
                        })
                    })
                    .collect()
            });
            results.extend(chunk_results);
        }
        results
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(Cancellable::is_cancelled)
            .unwrap_or(false)
    }

    fn run(&self, operation: Operation, config: &Configuration) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let kind = config.signature_kind();
        let output_path = config.output_path();

        let mut report = RunReport {
            operation,
            kind,
            outcome: Outcome::failure(Status::FailTimeout, Vec::new()),
            fingerprint: String::new(),
            output_path: output_path.clone(),
            baseline_path: None,
            keep_path: None,
            element_count: None,
            exit_code: None,
            duration: Duration::ZERO,
        };

        if self.is_cancelled() {
            report.outcome = Outcome::failure(
                Status::FailTimeout,
                vec!["Run cancelled before the tool was started".to_string()],
            );
            return Ok(finish(report, started));
        }

        let tool = self.resolver.resolve(config)?;
        let command_line = tool.command_line(&arguments::build(config));
        report.fingerprint = fingerprint(&tool.program, &command_line);
        log::info!(
            "Starting {} run: kind={} args={} fingerprint={}",
            operation,
            kind,
            command_line.len(),
            short(&report.fingerprint)
        );

        prepare_output(&output_path, operation)?;

        let execution = match self
            .executor
            .invoke(&tool.program, &command_line, config.timeout())
        {
            Ok(execution) => execution,
            Err(e) => {
                log::error!("{}", e);
                report.outcome = Outcome::failure(Status::FailToolError, vec![e.to_string()]);
                return Ok(finish(report, started));
            }
        };
        report.exit_code = Some(execution.exit_code);

        // Cancelled while the tool ran: no parse, no diff
        if self.is_cancelled() && !execution.timed_out {
            log::warn!("Run cancelled; discarding tool output");
            report.outcome = Outcome::failure(
                Status::FailTimeout,
                vec!["Run cancelled; tool output discarded".to_string()],
            );
            return Ok(finish(report, started));
        }

        if let Some(outcome) = enforcement::execution_failure(&execution, config) {
            report.outcome = outcome;
            return Ok(finish(report, started));
        }

        let current = match read_tool_output(&output_path, config) {
            Ok(current) => current,
            Err(message) => {
                report.outcome = tool_output_failure(message, &execution);
                return Ok(finish(report, started));
            }
        };
        report.element_count = Some(current.len());

        report.outcome = match operation {
            Operation::Generate => {
                report.keep_path = keep_rules::write_keep_file(&current, config)?;
                enforcement::evaluate(None, &execution, config)
            }
            Operation::Check => {
                let baseline_path = config.baseline_path();
                let baseline = load_baseline(&baseline_path, config)?;
                report.baseline_path = Some(baseline_path);
                let diff = signature::diff(&baseline, &current);
                enforcement::evaluate(Some(diff), &execution, config)
            }
        };
        Ok(finish(report, started))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// SHA-256 hex digest over the program and its arguments
///
/// Each part is terminated by a NUL byte so `["ab", "c"]` and `["a", "bc"]`
/// differ.
pub fn fingerprint(program: &Path, args: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(program.display().to_string().as_bytes());
    hasher.update([0u8]);
    for arg in args {
        hasher.update(arg.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

fn finish(mut report: RunReport, started: Instant) -> RunReport {
    report.duration = started.elapsed();
    log::info!(
        "Finished {} run: kind={} status={} duration_ms={}",
        report.operation,
        report.kind,
        report.outcome.status(),
        report.duration.as_millis()
    );
    report
}

/// Make sure the tool can write `path` and that no stale output survives
fn prepare_output(path: &Path, operation: Operation) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    if operation == Operation::Check {
        match std::fs::remove_file(path) {
            Ok(()) => log::debug!("Removed stale output {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(PipelineError::io(path, e)),
        }
    }
    Ok(())
}

/// The tool's output, or a message describing why it is unusable
fn read_tool_output(path: &Path, config: &Configuration) -> Result<SignatureFile, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Tool did not produce {}: {}", path.display(), e))?;
    signature::parse(&text, config.parse_options())
        .map_err(|e| format!("Malformed signature output {}: {}", path.display(), e))
}

fn tool_output_failure(message: String, execution: &ExecutionResult) -> Outcome {
    log::error!("{}", message);
    let mut messages = vec![message];
    let stderr = execution.stderr.trim_end();
    if !stderr.is_empty() {
        messages.push(stderr.to_string());
    }
    Outcome::failure(Status::FailToolError, messages)
}

/// Read the accepted baseline; a missing file is an empty signature
pub fn load_baseline(path: &Path, config: &Configuration) -> Result<SignatureFile, PipelineError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::warn!(
                "No baseline at {}; every element is reported as added",
                path.display()
            );
            return Ok(SignatureFile::default());
        }
        Err(e) => return Err(PipelineError::io(path, e)),
    };
    signature::parse(&text, config.parse_options()).map_err(|source| {
        PipelineError::MalformedBaseline {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiType;
    use crate::errors::{ToolExecutionError, ToolResolutionError};
    use crate::tool::ResolvedTool;
    use std::fs;
    use std::sync::Mutex;

    const SIGNATURE: &str = "// Signature format: 4.0\npackage foo {\n\n  public class Bar {\n    method public void baz(int);\n  }\n\n}\n\n";

    struct FixedResolver;

    impl ToolResolver for FixedResolver {
        fn resolve(&self, _config: &Configuration) -> Result<ResolvedTool, ToolResolutionError> {
            Ok(ResolvedTool::direct("/opt/metalava/bin/metalava"))
        }
    }

    /// Writes `output` to the `--api`/`--removed-api` path and returns `result`
    struct ScriptedExecutor {
        output: Option<String>,
        result: ExecutionResult,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedExecutor {
        fn new(output: Option<&str>, result: ExecutionResult) -> Self {
            Self {
                output: output.map(String::from),
                result,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ToolExecutor for ScriptedExecutor {
        fn invoke(
            &self,
            _program: &Path,
            args: &[String],
            _timeout: Duration,
        ) -> Result<ExecutionResult, ToolExecutionError> {
            self.calls.lock().unwrap().push(args.to_vec());
            let position = args
                .iter()
                .position(|a| a == "--api" || a == "--removed-api")
                .unwrap();
            if let Some(output) = &self.output {
                fs::write(&args[position + 1], output).unwrap();
            }
            Ok(self.result.clone())
        }
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        dir
    }

    fn pipeline(executor: ScriptedExecutor) -> (SignaturePipeline, Arc<ScriptedExecutor>) {
        let executor = Arc::new(executor);
        let pipeline = SignaturePipeline::new(Arc::new(FixedResolver), executor.clone());
        (pipeline, executor)
    }

    #[test]
    fn test_fingerprint_is_stable_and_separating() {
        let program = Path::new("java");
        let a = fingerprint(program, &["ab".to_string(), "c".to_string()]);
        let b = fingerprint(program, &["a".to_string(), "bc".to_string()]);
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, fingerprint(program, &["ab".to_string(), "c".to_string()]));
    }

    #[test]
    fn test_check_identical_output_passes() {
        let dir = project();
        fs::write(dir.path().join("api.txt"), SIGNATURE).unwrap();
        let config = Configuration::builder().build(dir.path()).unwrap();
        let (pipeline, executor) =
            pipeline(ScriptedExecutor::new(Some(SIGNATURE), ExecutionResult::default()));

        let report = pipeline.check(&config).unwrap();
        assert_eq!(report.outcome.status(), Status::Pass);
        assert!(report.outcome.diff().unwrap().is_empty());
        assert_eq!(report.element_count, Some(2));

        // The baseline is never the tool's output path.
        let calls = executor.calls.lock().unwrap();
        let position = calls[0].iter().position(|a| a == "--api").unwrap();
        assert_ne!(PathBuf::from(&calls[0][position + 1]), config.baseline_path());
        assert_eq!(fs::read_to_string(config.baseline_path()).unwrap(), SIGNATURE);
    }

    #[test]
    fn test_check_reports_removed_member() {
        let dir = project();
        fs::write(dir.path().join("api.txt"), SIGNATURE).unwrap();
        let config = Configuration::builder().build(dir.path()).unwrap();
        let current = SIGNATURE.replace("    method public void baz(int);\n", "");
        let (pipeline, _) =
            pipeline(ScriptedExecutor::new(Some(&current), ExecutionResult::default()));

        let report = pipeline.check(&config).unwrap();
        assert_eq!(report.outcome.status(), Status::FailDrift);
        assert_eq!(report.outcome.report_lines(), vec!["REMOVED foo.Bar#baz(int)"]);
        assert_eq!(report.outcome.exit_code(), 1);
    }

    #[test]
    fn test_missing_baseline_reports_everything_added() {
        let dir = project();
        let config = Configuration::builder().build(dir.path()).unwrap();
        let (pipeline, _) =
            pipeline(ScriptedExecutor::new(Some(SIGNATURE), ExecutionResult::default()));

        let report = pipeline.check(&config).unwrap();
        assert_eq!(report.outcome.status(), Status::FailDrift);
        assert_eq!(report.outcome.diff().unwrap().added.len(), 2);
    }

    #[test]
    fn test_malformed_output_is_tool_error() {
        let dir = project();
        let config = Configuration::builder().build(dir.path()).unwrap();
        let (pipeline, _) = pipeline(ScriptedExecutor::new(
            Some("package foo {\n"),
            ExecutionResult::default(),
        ));

        let report = pipeline.check(&config).unwrap();
        assert_eq!(report.outcome.status(), Status::FailToolError);
        assert!(report.outcome.diff().is_none());
        assert!(report.outcome.messages()[0].contains("Malformed"));
    }

    #[test]
    fn test_malformed_baseline_is_error() {
        let dir = project();
        fs::write(dir.path().join("api.txt"), "// Signature format: 7.0\n").unwrap();
        let config = Configuration::builder().build(dir.path()).unwrap();
        let (pipeline, _) =
            pipeline(ScriptedExecutor::new(Some(SIGNATURE), ExecutionResult::default()));

        let err = pipeline.check(&config).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedBaseline { .. }));
    }

    #[test]
    fn test_generate_writes_in_place_and_keep_rules() {
        let dir = project();
        let config = Configuration::builder()
            .keep_filename("keep.pro")
            .build(dir.path())
            .unwrap();
        let (pipeline, _) =
            pipeline(ScriptedExecutor::new(Some(SIGNATURE), ExecutionResult::default()));

        let report = pipeline.generate(&config).unwrap();
        assert_eq!(report.outcome.status(), Status::Pass);
        assert!(report.outcome.diff().is_none());
        assert_eq!(report.output_path, config.output_path());
        assert_eq!(
            fs::read_to_string(dir.path().join("keep.pro")).unwrap(),
            "-keep class foo.Bar { *; }\n"
        );
    }

    #[test]
    fn test_cancelled_pipeline_never_invokes() {
        let dir = project();
        let config = Configuration::builder().build(dir.path()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let (pipeline, executor) =
            pipeline(ScriptedExecutor::new(Some(SIGNATURE), ExecutionResult::default()));
        let pipeline = pipeline.with_cancellation(token);

        let report = pipeline.check(&config).unwrap();
        assert_eq!(report.outcome.status(), Status::FailTimeout);
        assert!(report.outcome.diff().is_none());
        assert!(executor.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_check_all_keeps_input_order_and_separate_outputs() {
        let dir = project();
        fs::write(dir.path().join("api.txt"), SIGNATURE).unwrap();
        let config = Configuration::builder().build(dir.path()).unwrap();
        let configs = vec![config.surface(ApiType::Api), config.surface(ApiType::Removed)];
        let (pipeline, executor) =
            pipeline(ScriptedExecutor::new(Some(SIGNATURE), ExecutionResult::default()));

        let results = pipeline.check_all(&configs);
        assert_eq!(results.len(), 2);
        let api = results[0].as_ref().unwrap();
        let removed = results[1].as_ref().unwrap();
        assert_eq!(api.kind, SignatureKind::Api);
        assert_eq!(api.outcome.status(), Status::Pass);
        assert_eq!(removed.kind, SignatureKind::Removed);
        // No removed.txt baseline yet
        assert_eq!(removed.outcome.status(), Status::FailDrift);
        assert_ne!(api.output_path, removed.output_path);
        assert_eq!(executor.calls.lock().unwrap().len(), 2);
    }

    /// Cancels `token` while the tool is "running", then lets it finish
    struct CancellingExecutor {
        inner: ScriptedExecutor,
        token: CancellationToken,
    }

    impl ToolExecutor for CancellingExecutor {
        fn invoke(
            &self,
            program: &Path,
            args: &[String],
            timeout: Duration,
        ) -> Result<ExecutionResult, ToolExecutionError> {
            self.token.cancel();
            self.inner.invoke(program, args, timeout)
        }
    }

    #[test]
    fn test_cancelled_during_run_discards_output() {
        let dir = project();
        fs::write(dir.path().join("api.txt"), SIGNATURE).unwrap();
        let config = Configuration::builder().build(dir.path()).unwrap();
        let drifted = SIGNATURE.replace("baz(int)", "baz(long)");
        let token = CancellationToken::new();
        let executor = CancellingExecutor {
            inner: ScriptedExecutor::new(Some(&drifted), ExecutionResult::default()),
            token: token.clone(),
        };
        let pipeline = SignaturePipeline::new(Arc::new(FixedResolver), Arc::new(executor))
            .with_cancellation(token);

        let report = pipeline.check(&config).unwrap();
        assert_eq!(report.outcome.status(), Status::FailTimeout);
        assert!(report.outcome.diff().is_none());
        assert!(report.element_count.is_none());
        assert!(report.outcome.messages()[0].contains("cancelled"));
    }

    #[test]
    fn test_check_removed_surface_reads_removed_baseline() {
        let dir = project();
        fs::write(dir.path().join("api.txt"), "// Signature format: 4.0\n").unwrap();
        fs::write(dir.path().join("removed.txt"), SIGNATURE).unwrap();
        let config = Configuration::builder()
            .api_type(ApiType::Removed)
            .build(dir.path())
            .unwrap();
        let (pipeline, executor) =
            pipeline(ScriptedExecutor::new(Some(SIGNATURE), ExecutionResult::default()));

        let report = pipeline.check(&config).unwrap();
        assert_eq!(report.kind, SignatureKind::Removed);
        assert_eq!(
            report.baseline_path,
            Some(dir.path().canonicalize().unwrap().join("removed.txt"))
        );
        assert_eq!(report.outcome.status(), Status::Pass);
        assert!(executor.calls.lock().unwrap()[0].contains(&"--removed-api".to_string()));

        // Same baseline as the removed entry of check_all
        let all = pipeline.check_all(&[config.surface(ApiType::Removed)]);
        assert_eq!(all[0].as_ref().unwrap().baseline_path, report.baseline_path);
    }
}
