use tracing::debug;

use super::{to_args, DockerProvisioner};
use crate::error::Result;
use crate::store::{UnitFilter, UnitStore};
use crate::unit::{Unit, UnitStatus};

/// Inspect every running container that has a unit record.
///
/// A container with the application port bound is `Started`, otherwise
/// `Installing`. Containers without a record are skipped. The store is
/// left untouched; see [`persist_status`].
pub(super) async fn collect(p: &DockerProvisioner) -> Result<Vec<Unit>> {
    let ps = p.docker(to_args(["ps", "-q"])).await?;
    let listing = ps.stdout_lossy();

    let mut units = Vec::new();
    for id in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(mut unit) = p
            .units
            .find(&UnitFilter::by_name(id))
            .await?
            .into_iter()
            .next()
        else {
            debug!(container = %id, "Skipping container without a unit record");
            continue;
        };

        let inspect = p.inspect(id).await?;
        let observed = if inspect.host_port(&p.config.port).is_some() {
            UnitStatus::Started
        } else {
            UnitStatus::Installing
        };
        if unit.status.can_transition_to(observed) {
            unit.status = observed;
        }
        unit.ip = inspect.ip().to_string();
        units.push(unit);
    }
    debug!(units = units.len(), "Collected container status");
    Ok(units)
}

/// Write collected units back to the store. Returns how many were updated.
pub async fn persist_status(store: &dyn UnitStore, units: &[Unit]) -> Result<usize> {
    for unit in units {
        store.update(unit).await?;
    }
    Ok(units.len())
}
