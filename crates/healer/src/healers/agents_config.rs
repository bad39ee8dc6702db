use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::HealContext;
use crate::coordination::{unit_agent, CoordinationClient, Topology};
use crate::endpoints::CloudEndpoints;
use crate::error::Result;
use crate::registry::Healer;
use crate::remote::{agent_conf, RemoteShell, MACHINE_AGENT_CONF};

/// Keeps agent configs on unit hosts pointed at the current bootstrap
/// host.
///
/// The bootstrap host's private DNS name is resolved through the compute
/// API. On every unit host both the machine agent config and the unit
/// agent config must mention it; a config that does not gets its
/// `JUJU_ZOOKEEPER` line rewritten.
pub struct InstanceAgentsConfigHealer {
    coordination: CoordinationClient,
    shell: RemoteShell,
    cloud: CloudEndpoints,
}

impl InstanceAgentsConfigHealer {
    pub fn new(ctx: &HealContext) -> Self {
        Self {
            coordination: ctx.coordination.clone(),
            shell: ctx.shell.clone(),
            cloud: ctx.cloud.clone(),
        }
    }

    async fn bootstrap_private_dns(&self, topology: &Topology) -> Result<String> {
        let bootstrap = topology.bootstrap_machine()?;
        let compute = self.cloud.compute()?;
        let reservations = compute
            .describe_instances(std::slice::from_ref(&bootstrap.instance_id))
            .await?;
        reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .map(|i| i.private_dns_name)
            .find(|dns| !dns.is_empty())
            .ok_or_else(|| {
                provision::Error::NotFound(format!(
                    "private dns of bootstrap instance {}",
                    bootstrap.instance_id
                ))
                .into()
            })
    }

    /// `(host, config file)` pairs to check.
    fn targets(topology: &Topology) -> Vec<(String, String)> {
        topology
            .units()
            .flat_map(|(name, unit)| {
                [
                    (unit.public_address.clone(), MACHINE_AGENT_CONF.to_string()),
                    (unit.public_address.clone(), agent_conf(&unit_agent(name))),
                ]
            })
            .collect()
    }
}

#[async_trait]
impl Healer for InstanceAgentsConfigHealer {
    fn name(&self) -> &'static str {
        "instance-agents-config"
    }

    async fn needs_heal(&self) -> Result<bool> {
        let topology = self.coordination.status().await?;
        let dns = self.bootstrap_private_dns(&topology).await?;
        for (host, file) in Self::targets(&topology) {
            if !self.shell.has_line(&host, &dns, &file).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn heal(&self) -> Result<()> {
        let topology = self.coordination.status().await?;
        let dns = self.bootstrap_private_dns(&topology).await?;
        info!(dns = %dns, "Resolved bootstrap private dns");

        for (host, file) in Self::targets(&topology) {
            match self.shell.has_line(&host, &dns, &file).await {
                Ok(true) => debug!(host = %host, file = %file, "Agent config needs no cure"),
                Ok(false) => {
                    info!(host = %host, file = %file, "Injecting bootstrap private dns");
                    if let Err(e) = self.shell.point_agent_at(&host, &dns, &file).await {
                        warn!(host = %host, file = %file, error = %e, "Failed to rewrite agent config");
                    }
                }
                Err(e) => warn!(host = %host, file = %file, error = %e, "Failed to check agent config"),
            }
        }
        Ok(())
    }
}
