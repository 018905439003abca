//! The only concrete [`TestExecutor`] shipped by the binary: shells out to
//! the configured test command, optionally scoped to a set of target files.

use shde_core::{CoreError, ExecutorOutput, TestExecutor};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs `config.test_command` via `std::process::Command`, appending target
/// paths (if any) as trailing arguments.
pub struct ShellTestExecutor {
    program: String,
    base_args: Vec<String>,
    working_dir: PathBuf,
    /// When set, every run is scoped to this file regardless of what the
    /// caller passes — backs the `debug --file` CLI flag.
    fixed_scope: Option<PathBuf>,
}

impl ShellTestExecutor {
    /// Build an executor from a `program arg1 arg2 ...` command line and the
    /// directory to run it in.
    pub fn new(command: &[String], working_dir: impl Into<PathBuf>) -> Self {
        let (program, base_args) = command
            .split_first()
            .map(|(p, rest)| (p.clone(), rest.to_vec()))
            .unwrap_or_else(|| ("pytest".to_string(), Vec::new()));
        Self {
            program,
            base_args,
            working_dir: working_dir.into(),
            fixed_scope: None,
        }
    }

    /// Restrict every run to `path`, ignoring whatever the debug loop asks
    /// for.
    pub fn with_fixed_scope(mut self, path: Option<PathBuf>) -> Self {
        self.fixed_scope = path;
        self
    }
}

impl TestExecutor for ShellTestExecutor {
    fn run(&self, targets: Option<&[&Path]>) -> Result<ExecutorOutput, CoreError> {
        let mut command = Command::new(&self.program);
        command.current_dir(&self.working_dir).args(&self.base_args);
        if let Some(scoped) = &self.fixed_scope {
            command.arg(scoped);
        } else if let Some(paths) = targets {
            command.args(paths.iter().map(|p| p.as_os_str()));
        }

        let output = command
            .output()
            .map_err(|e| CoreError::Executor(format!("{} {:?}: {e}", self.program, self.base_args)))?;

        Ok(ExecutorOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
