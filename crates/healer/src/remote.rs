//! Privileged remote commands on fleet hosts.
//!
//! Every command is `ssh -o "StrictHostKeyChecking no" -q -l <user> <host> ...`.
//! Passwordless administrative access to the hosts is assumed to exist.

use std::fmt;
use std::sync::Arc;

use provision::Executor;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Machine agent upstart job.
pub const MACHINE_AGENT: &str = "juju-machine-agent";
/// Provisioning agent upstart job, bootstrap host only.
pub const PROVISION_AGENT: &str = "juju-provision-agent";
/// Coordination service upstart job.
pub const ZOOKEEPER: &str = "zookeeper";
/// Machine agent configuration file.
pub const MACHINE_AGENT_CONF: &str = "/etc/init/juju-machine-agent.conf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstart {
    Stop,
    Start,
}

impl fmt::Display for Upstart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => write!(f, "stop"),
            Self::Start => write!(f, "start"),
        }
    }
}

/// Configuration file of a unit agent job.
pub fn agent_conf(agent: &str) -> String {
    format!("/etc/init/{agent}.conf")
}

#[derive(Clone)]
pub struct RemoteShell {
    executor: Arc<dyn Executor>,
    user: String,
    zookeeper_port: u16,
}

impl RemoteShell {
    pub fn new(executor: Arc<dyn Executor>, user: impl Into<String>, zookeeper_port: u16) -> Self {
        Self {
            executor,
            user: user.into(),
            zookeeper_port,
        }
    }

    fn ssh_args(&self, host: &str, remote: &[&str]) -> Vec<String> {
        ["-o", "StrictHostKeyChecking no", "-q", "-l", self.user.as_str(), host]
            .iter()
            .chain(remote)
            .map(|s| (*s).to_string())
            .collect()
    }

    /// `sudo <stop|start> <daemon>` on `host`.
    pub async fn upstart(&self, action: Upstart, daemon: &str, host: &str) -> Result<()> {
        let action = action.to_string();
        let args = self.ssh_args(host, &["sudo", &action, daemon]);
        debug!(host, daemon, action = %action, "Running upstart command");
        self.executor.run("ssh", &args).await?;
        Ok(())
    }

    /// Stop then start `daemon`. A failed stop is logged; the start result
    /// is returned.
    pub async fn restart(&self, daemon: &str, host: &str) -> Result<()> {
        if let Err(e) = self.upstart(Upstart::Stop, daemon, host).await {
            warn!(host, daemon, error = %e, "Stop failed, starting anyway");
        }
        self.upstart(Upstart::Start, daemon, host).await
    }

    /// Whether `file` on `host` contains `pattern`.
    pub async fn has_line(&self, host: &str, pattern: &str, file: &str) -> Result<bool> {
        let args = self.ssh_args(host, &["grep", pattern, file]);
        Ok(self.executor.execute("ssh", &args).await?.success())
    }

    /// Point the coordination address line of `file` at `dns`.
    pub async fn point_agent_at(&self, host: &str, dns: &str, file: &str) -> Result<()> {
        let expr = format!(
            "'s/env JUJU_ZOOKEEPER=.*/env JUJU_ZOOKEEPER=\"{dns}:{}\"/g'",
            self.zookeeper_port
        );
        let args = self.ssh_args(host, &["sudo", "sed", "-i", &expr, file]);
        info!(host, file, dns, "Rewriting coordination address");
        self.executor.run("ssh", &args).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ssh;
    use provision::testing::FakeExecutor;

    fn shell(exec: &Arc<FakeExecutor>) -> RemoteShell {
        RemoteShell::new(exec.clone(), "ubuntu", 2181)
    }

    fn has(exec: &FakeExecutor, args: &[String]) -> bool {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        exec.executed("ssh", &args)
    }

    #[tokio::test]
    async fn test_upstart_command_shape() {
        let exec = Arc::new(FakeExecutor::new());
        shell(&exec)
            .upstart(Upstart::Stop, ZOOKEEPER, "10.10.10.1")
            .await
            .unwrap();
        assert!(has(&exec, &ssh("10.10.10.1", &["sudo", "stop", "zookeeper"])));
    }

    #[tokio::test]
    async fn test_restart_starts_after_failed_stop() {
        let exec = Arc::new(
            FakeExecutor::new().with_failure(
                "ssh -o StrictHostKeyChecking no -q -l ubuntu h sudo stop zookeeper",
                "stop: Unknown instance",
            ),
        );
        shell(&exec).restart(ZOOKEEPER, "h").await.unwrap();
        assert_eq!(exec.calls().len(), 2);
        assert!(has(&exec, &ssh("h", &["sudo", "start", "zookeeper"])));
    }

    #[tokio::test]
    async fn test_restart_returns_start_failure() {
        let exec = Arc::new(FakeExecutor::new().with_failure("*", "Connection refused"));
        assert!(shell(&exec).restart(ZOOKEEPER, "h").await.is_err());
    }

    #[tokio::test]
    async fn test_has_line_reports_grep_result() {
        let exec = Arc::new(FakeExecutor::new().with_failure(
            "ssh -o StrictHostKeyChecking no -q -l ubuntu h grep dns.internal /etc/init/juju-x-0.conf",
            "",
        ));
        let shell = shell(&exec);
        assert!(shell.has_line("h", "dns.internal", MACHINE_AGENT_CONF).await.unwrap());
        assert!(!shell
            .has_line("h", "dns.internal", &agent_conf("juju-x-0"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_point_agent_at_uses_sed() {
        let exec = Arc::new(FakeExecutor::new());
        shell(&exec)
            .point_agent_at("h", "ip-10-0-0-1.ec2.internal", MACHINE_AGENT_CONF)
            .await
            .unwrap();
        let expr = "'s/env JUJU_ZOOKEEPER=.*/env JUJU_ZOOKEEPER=\"ip-10-0-0-1.ec2.internal:2181\"/g'";
        assert!(has(
            &exec,
            &ssh("h", &["sudo", "sed", "-i", expr, MACHINE_AGENT_CONF])
        ));
    }
}
