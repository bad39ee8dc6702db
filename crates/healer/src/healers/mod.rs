//! The built-in healers.
//!
//! | Name | Repairs |
//! |---|---|
//! | `bootstrap-machine` | bootstrap machine agent stuck in `not-started` |
//! | `bootstrap-provision` | provisioning agent on the bootstrap host |
//! | `instance-machine` | machine agents reported `down` |
//! | `instance-unit` | unit agents reported `down` |
//! | `instance-agents-config` | agent configs pointing at a stale bootstrap address |
//! | `zookeeper` | coordination service not answering `imok` |
//! | `bootstrap-instanceid` | provider-state blob naming the wrong bootstrap instance |
//! | `elb-instance` | units failing their load balancer health checks |

mod agents_config;
mod bootstrap;
mod elb;
mod instance;
mod instance_id;
mod zookeeper;

use std::sync::Arc;

use drydock_config::JujuConfig;
use provision::{Executor, Provisioner, UnitStore};

use crate::coordination::CoordinationClient;
use crate::endpoints::CloudEndpoints;
use crate::registry::HealerRegistry;
use crate::remote::RemoteShell;

pub use agents_config::InstanceAgentsConfigHealer;
pub use bootstrap::{BootstrapMachineHealer, BootstrapProvisionHealer};
pub use elb::{is_unhealthy, ElbInstanceHealer, UNHEALTHY_DESCRIPTION};
pub use instance::{InstanceMachineHealer, InstanceUnitHealer};
pub use instance_id::{parse_provider_state, BootstrapInstanceIdHealer, PROVIDER_STATE};
pub use zookeeper::ZookeeperHealer;

/// Everything the healers reach out to.
#[derive(Clone)]
pub struct HealContext {
    pub juju: JujuConfig,
    pub coordination: CoordinationClient,
    pub shell: RemoteShell,
    pub cloud: CloudEndpoints,
    pub units: Arc<dyn UnitStore>,
    pub provisioner: Arc<dyn Provisioner>,
}

impl HealContext {
    pub fn new(
        juju: JujuConfig,
        executor: Arc<dyn Executor>,
        cloud: CloudEndpoints,
        units: Arc<dyn UnitStore>,
        provisioner: Arc<dyn Provisioner>,
    ) -> Self {
        Self {
            coordination: CoordinationClient::new(&juju.binary, executor.clone()),
            shell: RemoteShell::new(executor, &juju.ssh_user, juju.zookeeper_port),
            juju,
            cloud,
            units,
            provisioner,
        }
    }
}

/// A registry holding every built-in healer.
pub fn registry(ctx: &HealContext) -> HealerRegistry {
    let mut registry = HealerRegistry::new();
    registry
        .register(Arc::new(BootstrapMachineHealer::new(ctx)))
        .register(Arc::new(BootstrapProvisionHealer::new(ctx)))
        .register(Arc::new(InstanceMachineHealer::new(ctx)))
        .register(Arc::new(InstanceUnitHealer::new(ctx)))
        .register(Arc::new(InstanceAgentsConfigHealer::new(ctx)))
        .register(Arc::new(ZookeeperHealer::new(ctx)))
        .register(Arc::new(BootstrapInstanceIdHealer::new(ctx)))
        .register(Arc::new(ElbInstanceHealer::new(ctx)));
    registry
}
