//! Explicit subprocess execution context.
//!
//! Every version probe and every subprocess-backed getter receives an
//! [`ExecContext`] instead of reading process-wide state. The context owns the
//! [`CommandRunner`] (real or scripted), the probe timeout and the debug switch
//! that controls whether subprocess output is logged.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::{Error, Result};

/// Default upper bound for a single `--version` style probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout followed by stderr, the way `CombinedOutput` would read.
    #[must_use]
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs a program to completion and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync + std::fmt::Debug {
    /// Run `program` with `args`, optionally inside `cwd`.
    ///
    /// # Errors
    ///
    /// Returns the spawn error when the program cannot be started.
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: Option<&Path>,
    ) -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: Option<&Path>,
    ) -> std::io::Result<CommandOutput> {
        let mut command = tokio::process::Command::new(program);
        command.args(args).kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().await?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }
}

/// Execution context passed into every probe and subprocess call.
#[derive(Debug, Clone)]
pub struct ExecContext {
    runner: Arc<dyn CommandRunner>,
    probe_timeout: Duration,
    debug: bool,
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecContext {
    /// Context running real processes with the default probe timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner))
    }

    /// Context backed by a custom runner.
    #[must_use]
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            debug: false,
        }
    }

    /// Set the probe timeout.
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Log subprocess output at debug level.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Invoke a tool binary to read its version.
    ///
    /// The exit status is not interpreted: several tools print their version
    /// and exit non-zero. Only a failure to start the binary is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBinary`] when the program cannot be started and
    /// [`Error::ProbeTimeout`] when it does not finish within the probe timeout.
    pub async fn probe(&self, tool: &str, program: &Path, args: &[&str]) -> Result<CommandOutput> {
        let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        trace!(tool, program = %program.display(), ?args, "Probing tool version");

        let output = tokio::time::timeout(self.probe_timeout, self.runner.run(program, &args, None))
            .await
            .map_err(|_| Error::ProbeTimeout {
                tool: tool.to_string(),
                seconds: self.probe_timeout.as_secs(),
            })?
            .map_err(|e| Error::missing_binary(tool, program, e.to_string()))?;

        if self.debug {
            debug!(tool, output = %output.combined(), "Probe output");
        }
        Ok(output)
    }

    /// Run a helper program (git, hg) to completion, without a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the program cannot be started.
    pub async fn run(
        &self,
        program: impl Into<PathBuf>,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput> {
        let program = program.into();
        debug!(program = %program.display(), ?args, "Running command");

        let output = self
            .runner
            .run(&program, args, cwd)
            .await
            .map_err(|e| Error::io(e, &program, "spawn"))?;

        if self.debug {
            debug!(program = %program.display(), output = %output.combined(), "Command output");
        }
        Ok(output)
    }
}
