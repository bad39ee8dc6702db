//! # Healer
//!
//! Self-healing for the Drydock fleet. Each healer detects one class of
//! inconsistency (a stopped agent, a stale config line, an unhealthy
//! load balancer instance) and repairs it.
//!
//! Healers are registered once in a [`HealerRegistry`] and invoked by name,
//! from the CLI or the HTTP trigger. Scheduling belongs to whatever calls
//! the trigger.
//!
//! ```rust,ignore
//! let ctx = HealContext::new(config.juju, executor, cloud, store, provisioner);
//! let registry = healers::registry(&ctx);
//! for report in registry.heal_all().await {
//!     println!("{}: {:?}", report.name, report.outcome);
//! }
//! ```

pub mod coordination;
pub mod endpoints;
pub mod error;
pub mod healers;
pub mod probe;
pub mod registry;
pub mod remote;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use endpoints::CloudEndpoints;
pub use error::{HealError, Result};
pub use healers::HealContext;
pub use registry::{HealOutcome, HealReport, Healer, HealerRegistry};
