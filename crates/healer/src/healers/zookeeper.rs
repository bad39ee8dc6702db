use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::HealContext;
use crate::coordination::CoordinationClient;
use crate::error::Result;
use crate::probe;
use crate::registry::Healer;
use crate::remote::{RemoteShell, ZOOKEEPER};

/// Restarts the coordination service on the bootstrap host when it does
/// not answer `imok`. An unreachable service counts as unhealthy.
pub struct ZookeeperHealer {
    coordination: CoordinationClient,
    shell: RemoteShell,
    port: u16,
    timeout: Duration,
}

impl ZookeeperHealer {
    pub fn new(ctx: &HealContext) -> Self {
        Self {
            coordination: ctx.coordination.clone(),
            shell: ctx.shell.clone(),
            port: ctx.juju.zookeeper_port,
            timeout: ctx.juju.probe_timeout(),
        }
    }

    /// Bootstrap host, and whether its service is unhealthy.
    async fn check(&self) -> Result<(String, bool)> {
        let topology = self.coordination.status().await?;
        let host = topology.bootstrap_machine()?.dns_name.clone();
        let addr = format!("{host}:{}", self.port);
        let healthy = probe::is_healthy(&addr, self.timeout).await;
        Ok((host, !healthy))
    }
}

#[async_trait]
impl Healer for ZookeeperHealer {
    fn name(&self) -> &'static str {
        "zookeeper"
    }

    async fn needs_heal(&self) -> Result<bool> {
        Ok(self.check().await?.1)
    }

    async fn heal(&self) -> Result<()> {
        let (host, unhealthy) = self.check().await?;
        if !unhealthy {
            debug!("Zookeeper needs no cure, skipping");
            return Ok(());
        }
        info!(host = %host, "Healing zookeeper");
        self.shell.restart(ZOOKEEPER, &host).await
    }
}
