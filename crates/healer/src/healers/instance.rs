//! Machine and unit agents across the fleet.
//!
//! One host failing to restart never stops the others from being tried.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::HealContext;
use crate::coordination::{unit_agent, CoordinationClient, AGENT_DOWN};
use crate::error::Result;
use crate::registry::Healer;
use crate::remote::{RemoteShell, MACHINE_AGENT};

pub struct InstanceMachineHealer {
    coordination: CoordinationClient,
    shell: RemoteShell,
}

impl InstanceMachineHealer {
    pub fn new(ctx: &HealContext) -> Self {
        Self {
            coordination: ctx.coordination.clone(),
            shell: ctx.shell.clone(),
        }
    }
}

#[async_trait]
impl Healer for InstanceMachineHealer {
    fn name(&self) -> &'static str {
        "instance-machine"
    }

    async fn needs_heal(&self) -> Result<bool> {
        let topology = self.coordination.status().await?;
        Ok(topology.machines.values().any(|m| m.agent_state == AGENT_DOWN))
    }

    async fn heal(&self) -> Result<()> {
        let topology = self.coordination.status().await?;
        for (index, machine) in &topology.machines {
            if machine.agent_state != AGENT_DOWN {
                debug!(machine = index, instance = %machine.instance_id, "Machine agent needs no cure, skipping");
                continue;
            }
            info!(machine = index, instance = %machine.instance_id, "Healing machine agent");
            if let Err(e) = self.shell.restart(MACHINE_AGENT, &machine.dns_name).await {
                warn!(machine = index, host = %machine.dns_name, error = %e, "Failed to heal machine agent");
            }
        }
        Ok(())
    }
}

pub struct InstanceUnitHealer {
    coordination: CoordinationClient,
    shell: RemoteShell,
}

impl InstanceUnitHealer {
    pub fn new(ctx: &HealContext) -> Self {
        Self {
            coordination: ctx.coordination.clone(),
            shell: ctx.shell.clone(),
        }
    }
}

#[async_trait]
impl Healer for InstanceUnitHealer {
    fn name(&self) -> &'static str {
        "instance-unit"
    }

    async fn needs_heal(&self) -> Result<bool> {
        let topology = self.coordination.status().await?;
        let down = topology.units().any(|(_, u)| u.agent_state == AGENT_DOWN);
        Ok(down)
    }

    async fn heal(&self) -> Result<()> {
        let topology = self.coordination.status().await?;
        for (name, unit) in topology.units() {
            let agent = unit_agent(name);
            if unit.agent_state != AGENT_DOWN {
                debug!(agent = %agent, "Unit agent needs no cure, skipping");
                continue;
            }
            info!(agent = %agent, host = %unit.public_address, "Healing unit agent");
            if let Err(e) = self.shell.restart(&agent, &unit.public_address).await {
                warn!(agent = %agent, host = %unit.public_address, error = %e, "Failed to heal unit agent");
            }
        }
        Ok(())
    }
}
