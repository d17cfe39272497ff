//! Shared test utilities for furyctl crates.
//!
//! [`ScriptedRunner`] replaces real subprocesses with canned output keyed by
//! the program's file name, so tool probes can be exercised without installing
//! anything.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::exec::{CommandOutput, CommandRunner};

/// A recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Fake [`CommandRunner`] answering from a table of canned outputs.
///
/// Programs missing from the table fail with `NotFound`, like a binary that
/// is not installed.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outputs: HashMap<String, CommandOutput>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer invocations of `program` (matched by file name) with `stdout`.
    #[must_use]
    pub fn with_output(mut self, program: &str, stdout: &str) -> Self {
        self.outputs.insert(
            program.to_string(),
            CommandOutput {
                success: true,
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
        self
    }

    /// Answer invocations of `program` with a full output record.
    #[must_use]
    pub fn with_command_output(mut self, program: &str, output: CommandOutput) -> Self {
        self.outputs.insert(program.to_string(), output);
        self
    }

    /// Sleep before answering, to exercise timeouts.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every invocation seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        _cwd: Option<&Path>,
    ) -> std::io::Result<CommandOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Invocation {
                program: program.to_path_buf(),
                args: args.to_vec(),
            });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        self.outputs.get(&name).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", program.display()),
            )
        })
    }
}
