//! Test doubles.
//!
//! Enabled for this crate's own tests and, through the `testing`
//! feature, for downstream crates.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::exec::{command_line, CommandOutput, Executor};

/// One recorded call to [`FakeExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Scripted executor that records every invocation.
///
/// Outputs and failures are keyed by either the full command line
/// (`"docker ps -q"`) or the arguments alone (`"ps -q"`); the key `"*"`
/// matches any command without a more specific entry. Unscripted commands
/// succeed with empty output.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    outputs: HashMap<String, Vec<u8>>,
    failures: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script stdout for a command.
    #[must_use]
    pub fn with_output(mut self, key: impl Into<String>, stdout: impl Into<Vec<u8>>) -> Self {
        self.outputs.insert(key.into(), stdout.into());
        self
    }

    /// Script a nonzero exit with `stderr` for a command.
    #[must_use]
    pub fn with_failure(mut self, key: impl Into<String>, stderr: impl Into<Vec<u8>>) -> Self {
        self.failures.insert(key.into(), stderr.into());
        self
    }

    /// Every invocation so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Invocations of `program`, each rendered as its joined arguments.
    pub fn calls_to(&self, program: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .map(|c| c.args.join(" "))
            .collect()
    }

    /// Whether `program` ran with exactly `args`.
    pub fn executed(&self, program: &str, args: &[&str]) -> bool {
        self.calls().iter().any(|c| {
            c.program == program && c.args.iter().map(String::as_str).eq(args.iter().copied())
        })
    }

    fn lookup<'a>(
        map: &'a HashMap<String, Vec<u8>>,
        full: &str,
        args: &str,
    ) -> Option<&'a Vec<u8>> {
        map.get(full).or_else(|| map.get(args))
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Invocation {
                program: program.to_string(),
                args: args.to_vec(),
            });
        }

        let full = command_line(program, args);
        let joined = args.join(" ");

        if let Some(stderr) = Self::lookup(&self.failures, &full, &joined)
            .or_else(|| self.failures.get("*"))
        {
            return Ok(CommandOutput {
                code: Some(1),
                stdout: Vec::new(),
                stderr: stderr.clone(),
            });
        }

        let stdout = Self::lookup(&self.outputs, &full, &joined)
            .or_else(|| self.outputs.get("*"))
            .cloned()
            .unwrap_or_default();
        Ok(CommandOutput {
            code: Some(0),
            stdout,
            stderr: Vec::new(),
        })
    }
}
