//! Healer trait and the registry that invokes healers by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::{HealError, Result};

/// An independent detect-and-repair strategy for one class of fleet
/// inconsistency.
///
/// `heal` must be safe to re-run after a successful heal. A healer is not
/// assumed reentrant against itself.
#[async_trait]
pub trait Healer: Send + Sync {
    /// Registry key.
    fn name(&self) -> &'static str;

    /// Side-effect free check. Healers without a precondition always heal.
    async fn needs_heal(&self) -> Result<bool> {
        Ok(true)
    }

    async fn heal(&self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealOutcome {
    Healed,
    Failed { error: String },
}

/// Result of one healer run within [`HealerRegistry::heal_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealReport {
    #[serde(rename = "healer")]
    pub name: String,
    #[serde(flatten)]
    pub outcome: HealOutcome,
}

impl HealReport {
    pub fn is_healed(&self) -> bool {
        self.outcome == HealOutcome::Healed
    }
}

#[derive(Clone)]
struct Entry {
    healer: Arc<dyn Healer>,
    /// Held for the duration of a run.
    running: Arc<Mutex<()>>,
}

impl Entry {
    /// Start a guarded run, or `Busy` while another run holds the lock.
    fn run(
        &self,
        name: &'static str,
    ) -> Result<impl std::future::Future<Output = Result<()>> + Send + 'static> {
        let guard = Arc::clone(&self.running)
            .try_lock_owned()
            .map_err(|_| HealError::Busy(name.to_string()))?;
        let healer = Arc::clone(&self.healer);
        Ok(async move {
            let _guard = guard;
            healer.heal().await
        })
    }
}

/// Healers keyed by name. Built once at startup, read-only afterwards.
///
/// A healer never runs concurrently with itself: a second run started
/// while one is in progress fails with [`HealError::Busy`].
#[derive(Default, Clone)]
pub struct HealerRegistry {
    healers: BTreeMap<&'static str, Entry>,
}

impl HealerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a healer under its own name, replacing any earlier registration.
    pub fn register(&mut self, healer: Arc<dyn Healer>) -> &mut Self {
        let name = healer.name();
        let entry = Entry {
            healer,
            running: Arc::new(Mutex::new(())),
        };
        if self.healers.insert(name, entry).is_some() {
            warn!(healer = name, "Healer registered twice, keeping the latest");
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Healer>> {
        self.healers.get(name).map(|e| Arc::clone(&e.healer))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.healers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.healers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.healers.is_empty()
    }

    /// Run one healer.
    pub async fn heal(&self, name: &str) -> Result<()> {
        let (&name, entry) = self
            .healers
            .get_key_value(name)
            .ok_or_else(|| HealError::UnknownHealer(name.to_string()))?;
        let run = entry.run(name).inspect_err(|_| {
            warn!(healer = name, "Healer already running, skipping");
        })?;
        info!(healer = name, "Running healer");
        run.await.inspect_err(|e| {
            error!(healer = name, error = %e, "Healer failed");
        })
    }

    /// Run every healer concurrently, each in its own task.
    ///
    /// A failing or panicking healer shows up in its own report only.
    pub async fn heal_all(&self) -> Vec<HealReport> {
        let tasks: Vec<_> = self
            .healers
            .iter()
            .map(|(name, entry)| {
                let run = entry.run(*name);
                let task = tokio::spawn(async move {
                    match run {
                        Ok(run) => run.await,
                        Err(busy) => Err(busy),
                    }
                });
                (*name, task)
            })
            .collect();

        let names: Vec<&'static str> = tasks.iter().map(|(n, _)| *n).collect();
        let results = futures::future::join_all(tasks.into_iter().map(|(_, t)| t)).await;

        names
            .into_iter()
            .zip(results)
            .map(|(name, joined)| {
                let outcome = match joined {
                    Ok(Ok(())) => HealOutcome::Healed,
                    Ok(Err(e)) => {
                        error!(healer = name, error = %e, "Healer failed");
                        HealOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                    Err(join) => {
                        error!(healer = name, error = %join, "Healer task aborted");
                        HealOutcome::Failed {
                            error: HealError::Panicked(name.to_string()).to_string(),
                        }
                    }
                };
                HealReport {
                    name: name.to_string(),
                    outcome,
                }
            })
            .collect()
    }
}
