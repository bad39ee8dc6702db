//! Snapshot of the coordination layer, read from `juju status`.

use std::collections::BTreeMap;
use std::sync::Arc;

use provision::Executor;
use serde::Deserialize;
use tracing::debug;

use crate::error::{HealError, Result};

/// Index of the bootstrap machine.
pub const BOOTSTRAP_MACHINE: u32 = 0;

/// Agent state reported for an agent that stopped answering.
pub const AGENT_DOWN: &str = "down";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Machine {
    #[serde(default)]
    pub agent_state: String,
    #[serde(default)]
    pub dns_name: String,
    #[serde(default)]
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceUnit {
    #[serde(default)]
    pub agent_state: String,
    #[serde(default)]
    pub machine: u32,
    #[serde(default)]
    pub public_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub units: BTreeMap<String, ServiceUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub machines: BTreeMap<u32, Machine>,
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
}

impl Topology {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        serde_yaml::from_slice(raw).map_err(|e| HealError::Parse {
            what: "coordination status".to_string(),
            reason: e.to_string(),
        })
    }

    /// The bootstrap machine is always machine 0.
    pub fn bootstrap_machine(&self) -> Result<&Machine> {
        self.machines.get(&BOOTSTRAP_MACHINE).ok_or_else(|| {
            provision::Error::NotFound(format!("bootstrap machine {BOOTSTRAP_MACHINE}")).into()
        })
    }

    /// Every service unit with its hierarchical name (`service/index`).
    pub fn units(&self) -> impl Iterator<Item = (&str, &ServiceUnit)> {
        self.services
            .values()
            .flat_map(|s| s.units.iter().map(|(name, unit)| (name.as_str(), unit)))
    }
}

/// Upstart job name of a unit agent: `juju-` plus the unit name with `/`
/// replaced by `-`.
pub fn unit_agent(unit_name: &str) -> String {
    format!("juju-{}", unit_name.replace('/', "-"))
}

/// Reads the coordination layer's status through the command executor.
#[derive(Clone)]
pub struct CoordinationClient {
    binary: String,
    executor: Arc<dyn Executor>,
}

impl CoordinationClient {
    pub fn new(binary: impl Into<String>, executor: Arc<dyn Executor>) -> Self {
        Self {
            binary: binary.into(),
            executor,
        }
    }

    pub async fn status(&self) -> Result<Topology> {
        let output = self
            .executor
            .run(&self.binary, &["status".to_string()])
            .await?;
        let topology = Topology::parse(&output.stdout)?;
        debug!(
            machines = topology.machines.len(),
            services = topology.services.len(),
            "Read coordination status"
        );
        Ok(topology)
    }
}
