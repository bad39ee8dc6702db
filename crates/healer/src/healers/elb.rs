use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use drydock_cloud::{InstanceHealth, LoadBalancerApi};
use provision::{App, Provisioner, UnitFilter, UnitStore};
use tracing::{debug, info, warn};

use super::HealContext;
use crate::endpoints::CloudEndpoints;
use crate::error::Result;
use crate::registry::Healer;

/// Description the load balancer reports for an instance that crossed its
/// unhealthy threshold.
pub const UNHEALTHY_DESCRIPTION: &str =
    "Instance has failed at least the UnhealthyThreshold number of health checks consecutively.";
const OUT_OF_SERVICE: &str = "OutOfService";
const REASON_INSTANCE: &str = "Instance";

/// Only this exact description, state and reason code qualify.
pub fn is_unhealthy(health: &InstanceHealth) -> bool {
    health.description == UNHEALTHY_DESCRIPTION
        && health.state == OUT_OF_SERVICE
        && health.reason_code == REASON_INSTANCE
}

/// Replaces units that their application's load balancer reports as failing.
///
/// Only applications with a unit stored as `Down` or `Error` are looked
/// up. Each application's balancer carries the application's name.
pub struct ElbInstanceHealer {
    enabled: bool,
    cloud: CloudEndpoints,
    units: Arc<dyn UnitStore>,
    provisioner: Arc<dyn Provisioner>,
}

impl ElbInstanceHealer {
    pub fn new(ctx: &HealContext) -> Self {
        Self {
            enabled: ctx.juju.use_elb,
            cloud: ctx.cloud.clone(),
            units: ctx.units.clone(),
            provisioner: ctx.provisioner.clone(),
        }
    }

    async fn unhealthy_apps(&self) -> Result<BTreeMap<String, App>> {
        let mut apps = BTreeMap::new();
        for unit in self.units.find(&UnitFilter::all()).await? {
            if unit.status.is_failure() {
                apps.entry(unit.app_name.clone())
                    .or_insert_with(|| App::new(unit.app_name, unit.unit_type));
            }
        }
        Ok(apps)
    }

    /// `(balancer, instance)` pairs matching the unhealthy triad.
    async fn unhealthy_instances(
        balancers: &dyn LoadBalancerApi,
        names: &[String],
    ) -> Result<Vec<(String, InstanceHealth)>> {
        let mut unhealthy = Vec::new();
        for lb in balancers.describe_load_balancers(names).await? {
            for health in balancers.describe_instance_health(&lb).await? {
                if is_unhealthy(&health) {
                    unhealthy.push((lb.clone(), health));
                } else {
                    debug!(lb = %lb, instance = %health.instance_id, state = %health.state, "Instance left alone");
                }
            }
        }
        Ok(unhealthy)
    }

    async fn replace(&self, app: &App, instance_id: &str) -> Result<()> {
        info!(app = %app.name, instance = instance_id, "Replacing unhealthy unit");
        self.provisioner.remove_unit(app, instance_id).await?;
        self.provisioner.add_units(app, 1).await?;
        Ok(())
    }
}

#[async_trait]
impl Healer for ElbInstanceHealer {
    fn name(&self) -> &'static str {
        "elb-instance"
    }

    async fn needs_heal(&self) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        let apps = self.unhealthy_apps().await?;
        if apps.is_empty() {
            return Ok(false);
        }
        let names: Vec<String> = apps.keys().cloned().collect();
        let balancers = self.cloud.balancers()?;
        Ok(!Self::unhealthy_instances(balancers.as_ref(), &names)
            .await?
            .is_empty())
    }

    async fn heal(&self) -> Result<()> {
        if !self.enabled {
            debug!("Load balancer integration disabled, skipping");
            return Ok(());
        }
        let apps = self.unhealthy_apps().await?;
        if apps.is_empty() {
            info!("No app is down");
            return Ok(());
        }

        let names: Vec<String> = apps.keys().cloned().collect();
        let balancers = self.cloud.balancers()?;
        let instances = Self::unhealthy_instances(balancers.as_ref(), &names).await?;
        info!(count = instances.len(), "Found unhealthy instances");

        for (lb, health) in instances {
            let Some(app) = apps.get(&lb) else {
                continue;
            };
            if let Err(e) = self.replace(app, &health.instance_id).await {
                warn!(app = %app.name, instance = %health.instance_id, error = %e, "Failed to replace unit");
            }
        }
        Ok(())
    }
}
