//! External collaborators SHDE treats as abstract contracts: the Test
//! Executor, the Patch Oracle, and the Artifact Sink. Concrete
//! implementations live outside this crate; the controller is generic over
//! them.

use crate::error::CoreError;
use std::path::Path;

/// Structured result of one test-suite invocation.
#[derive(Debug, Clone)]
pub struct ExecutorOutput {
    /// Process exit code.
    pub exit_code: i32,
    /// Combined or separate stdout.
    pub stdout: String,
    /// Combined or separate stderr.
    pub stderr: String,
}

impl ExecutorOutput {
    /// Whether the executor reported overall success.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout and stderr concatenated, the form the Failure Parser consumes.
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// A black-box test runner. Invoked optionally restricted to a set of
/// target files; implementations that cannot restrict scope may ignore
/// `targets` and run the full suite.
pub trait TestExecutor {
    /// Run the test suite, optionally scoped to `targets`.
    fn run(&self, targets: Option<&[&Path]>) -> Result<ExecutorOutput, CoreError>;
}

/// One external model provider behind the Patch Oracle Adapter (C6).
/// `suggest_patch` returns `Ok(None)` when the provider has no suggestion,
/// and `Err` only for transport/provider failures (handled by the adapter's
/// fallback chain, never propagated to the controller).
pub trait PatchOracleProvider {
    /// Ask this provider for a patch given a fully-formed prompt.
    fn suggest_patch(&self, prompt: &str) -> Result<Option<String>, CoreError>;

    /// Human-readable name for ledger/logging purposes.
    fn name(&self) -> &str;
}

/// Optional consumer of the merged Session Report (e-mail, chat, file).
/// Absence must not fail the session; a sink error should be logged by the
/// caller and swallowed, not propagated past `Reporter::merge`.
pub trait ArtifactSink {
    /// Publish a report. Implementations choose their own serialization.
    fn publish(&self, report_json: &str) -> Result<(), CoreError>;
}

/// An `ArtifactSink` that writes the report to a file, the minimal
/// always-available sink used when no external sink is configured.
pub struct FileArtifactSink {
    path: std::path::PathBuf,
}

impl FileArtifactSink {
    /// Target the given path.
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArtifactSink for FileArtifactSink {
    fn publish(&self, report_json: &str) -> Result<(), CoreError> {
        std::fs::write(&self.path, report_json)
            .map_err(|e| CoreError::ArtifactSink(format!("{}: {e}", self.path.display())))
    }
}
