//! Agents on the bootstrap machine.

use async_trait::async_trait;
use tracing::{debug, info};

use super::HealContext;
use crate::coordination::CoordinationClient;
use crate::error::Result;
use crate::registry::Healer;
use crate::remote::{RemoteShell, Upstart, MACHINE_AGENT, PROVISION_AGENT};

const NOT_STARTED: &str = "not-started";

/// Restarts the bootstrap machine agent when it never came up.
pub struct BootstrapMachineHealer {
    coordination: CoordinationClient,
    shell: RemoteShell,
}

impl BootstrapMachineHealer {
    pub fn new(ctx: &HealContext) -> Self {
        Self {
            coordination: ctx.coordination.clone(),
            shell: ctx.shell.clone(),
        }
    }
}

#[async_trait]
impl Healer for BootstrapMachineHealer {
    fn name(&self) -> &'static str {
        "bootstrap-machine"
    }

    async fn needs_heal(&self) -> Result<bool> {
        let topology = self.coordination.status().await?;
        Ok(topology.bootstrap_machine()?.agent_state == NOT_STARTED)
    }

    async fn heal(&self) -> Result<()> {
        let topology = self.coordination.status().await?;
        let bootstrap = topology.bootstrap_machine()?;
        if bootstrap.agent_state != NOT_STARTED {
            debug!("Bootstrap machine agent needs no cure, skipping");
            return Ok(());
        }
        info!(host = %bootstrap.dns_name, "Healing bootstrap machine agent");
        self.shell.restart(MACHINE_AGENT, &bootstrap.dns_name).await
    }
}

/// Starts the provisioning agent on the bootstrap host. Always attempted.
pub struct BootstrapProvisionHealer {
    coordination: CoordinationClient,
    shell: RemoteShell,
}

impl BootstrapProvisionHealer {
    pub fn new(ctx: &HealContext) -> Self {
        Self {
            coordination: ctx.coordination.clone(),
            shell: ctx.shell.clone(),
        }
    }
}

#[async_trait]
impl Healer for BootstrapProvisionHealer {
    fn name(&self) -> &'static str {
        "bootstrap-provision"
    }

    async fn heal(&self) -> Result<()> {
        let topology = self.coordination.status().await?;
        let bootstrap = topology.bootstrap_machine()?;
        info!(host = %bootstrap.dns_name, "Healing bootstrap provisioning agent");
        self.shell
            .upstart(Upstart::Start, PROVISION_AGENT, &bootstrap.dns_name)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::healers::tests::context;
    use crate::testing::{healthy_status, ssh};
    use provision::testing::FakeExecutor;
    use provision::MemoryStore;

    fn exec(status: &str) -> Arc<FakeExecutor> {
        Arc::new(FakeExecutor::new().with_output("juju status", status.to_string()))
    }

    #[tokio::test]
    async fn test_not_started_bootstrap_is_restarted() {
        let exec = exec(&healthy_status("not-started"));
        let healer = BootstrapMachineHealer::new(&context(exec.clone(), Arc::new(MemoryStore::new())));

        assert!(healer.needs_heal().await.unwrap());
        healer.heal().await.unwrap();
        assert_eq!(
            exec.calls_to("ssh"),
            vec![
                ssh("192.168.0.10", &["sudo", "stop", "juju-machine-agent"]).join(" "),
                ssh("192.168.0.10", &["sudo", "start", "juju-machine-agent"]).join(" "),
            ]
        );
    }

    #[tokio::test]
    async fn test_running_bootstrap_needs_no_cure() {
        let exec = exec(&healthy_status("running"));
        let healer = BootstrapMachineHealer::new(&context(exec.clone(), Arc::new(MemoryStore::new())));

        assert!(!healer.needs_heal().await.unwrap());
        healer.heal().await.unwrap();
        assert!(exec.calls_to("ssh").is_empty());
    }

    #[tokio::test]
    async fn test_provision_agent_is_always_started() {
        let exec = exec(&healthy_status("running"));
        let healer = BootstrapProvisionHealer::new(&context(exec.clone(), Arc::new(MemoryStore::new())));

        assert!(healer.needs_heal().await.unwrap());
        healer.heal().await.unwrap();
        let args = ssh("192.168.0.10", &["sudo", "start", "juju-provision-agent"]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        assert!(exec.executed("ssh", &args));
        assert_eq!(exec.calls_to("ssh").len(), 1);
    }

    #[tokio::test]
    async fn test_failed_start_is_reported() {
        let exec = Arc::new(
            FakeExecutor::new()
                .with_output("juju status", healthy_status("not-started"))
                .with_failure(
                    "ssh -o StrictHostKeyChecking no -q -l ubuntu 192.168.0.10 sudo start juju-machine-agent",
                    "Connection refused",
                ),
        );
        let healer = BootstrapMachineHealer::new(&context(exec, Arc::new(MemoryStore::new())));
        assert!(healer.heal().await.is_err());
    }
}
