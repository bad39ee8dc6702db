//! External command execution.
//!
//! Every interaction with the container runtime, the coordination tool
//! and remote hosts goes through an [`Executor`]. Components take it at
//! construction time so tests can substitute a scripted one.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Human-readable command line, used in logs and errors.
pub fn command_line(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

/// Runs external programs.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run `program` to completion.
    ///
    /// Spawn failures and timeouts are errors; a nonzero exit is reported
    /// through [`CommandOutput::code`].
    async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// Run `program` and require a zero exit status.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let output = self.execute(program, args).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(Error::Execution {
                command: command_line(program, args),
                stderr: output.stderr_lossy().trim().to_string(),
            })
        }
    }
}

/// Executor backed by real OS processes with a per-command deadline.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    timeout: Duration,
}

impl SystemExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

#[async_trait]
impl Executor for SystemExecutor {
    async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let line = command_line(program, args);
        debug!(command = %line, "Executing");

        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| Error::Timeout {
                what: line.clone(),
                after: self.timeout,
            })?
            .map_err(|e| Error::Execution {
                command: line,
                stderr: e.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_system_executor_captures_stdout() {
        let exec = SystemExecutor::default();
        let output = exec.run("echo", &args(&["hello"])).await.unwrap();
        assert_eq!(output.stdout_lossy().trim(), "hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_execution_error() {
        let exec = SystemExecutor::default();
        let output = exec
            .execute("sh", &args(&["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap();
        assert_eq!(output.code, Some(3));

        let err = exec
            .run("sh", &args(&["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            Error::Execution { stderr, .. } => assert_eq!(stderr, "oops"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_execution_error() {
        let exec = SystemExecutor::default();
        let err = exec
            .execute("/nonexistent/drydock-binary", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
    }

    #[tokio::test]
    async fn test_command_deadline() {
        let exec = SystemExecutor::new(Duration::from_millis(100));
        let err = exec.execute("sleep", &args(&["5"])).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
