use async_trait::async_trait;
use drydock_config::JujuConfig;
use tracing::{debug, info};

use super::HealContext;
use crate::endpoints::CloudEndpoints;
use crate::error::Result;
use crate::registry::Healer;

/// Object key of the provider-state blob.
pub const PROVIDER_STATE: &str = "provider-state";

const CONTENT_TYPE: &str = "binary/octet-stream";

/// Instance id recorded in a provider-state blob
/// (`zookeeper-instances: [<id>]`, or the bare id once rewritten).
pub fn parse_provider_state(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .replace("zookeeper-instances: [", "")
        .replace(']', "")
        .trim()
        .to_string()
}

/// Rewrites the provider-state blob when it names another instance than
/// the one currently in the bootstrap security group.
pub struct BootstrapInstanceIdHealer {
    cloud: CloudEndpoints,
    config: JujuConfig,
}

impl BootstrapInstanceIdHealer {
    pub fn new(ctx: &HealContext) -> Self {
        Self {
            cloud: ctx.cloud.clone(),
            config: ctx.juju.clone(),
        }
    }

    /// The id to write, if the blob is out of date.
    ///
    /// Either lookup failing, or no bootstrap instance being found, means
    /// there is nothing safe to write.
    async fn stale(&self) -> Result<Option<String>> {
        let bucket = self.config.bucket()?;
        let objects = self.cloud.objects()?;
        let compute = self.cloud.compute()?;

        let recorded = match objects.get(bucket, PROVIDER_STATE).await {
            Ok(raw) => parse_provider_state(&raw),
            Err(e) => {
                debug!(bucket, error = %e, "Could not read provider state");
                return Ok(None);
            }
        };
        let observed = match compute.describe_instances(&[]).await {
            Ok(reservations) => reservations
                .into_iter()
                .filter(|r| r.security_groups.contains(&self.config.bootstrap_group))
                .find_map(|r| r.instances.into_iter().next())
                .map(|i| i.instance_id),
            Err(e) => {
                debug!(error = %e, "Could not list instances");
                return Ok(None);
            }
        };

        match observed {
            Some(id) if id != recorded => Ok(Some(id)),
            Some(_) => Ok(None),
            None => {
                debug!(group = %self.config.bootstrap_group, "No instance in bootstrap group");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Healer for BootstrapInstanceIdHealer {
    fn name(&self) -> &'static str {
        "bootstrap-instanceid"
    }

    async fn needs_heal(&self) -> Result<bool> {
        Ok(self.stale().await?.is_some())
    }

    async fn heal(&self) -> Result<()> {
        let Some(id) = self.stale().await? else {
            debug!("Provider state needs no cure, skipping");
            return Ok(());
        };
        let bucket = self.config.bucket()?;
        info!(bucket, instance = %id, "Rewriting provider state");
        self.cloud
            .objects()?
            .put(bucket, PROVIDER_STATE, id.into_bytes(), CONTENT_TYPE)
            .await?;
        Ok(())
    }
}
