//! The provisioner capability set.

use std::io::Write;

use async_trait::async_trait;

use crate::error::Result;
use crate::unit::{App, Unit};

/// Turns application requests into running, addressable units.
///
/// Operations on the same application observe each other's writes through
/// the unit store. Multi-step operations are not rolled back on failure.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Registry name of the implementation.
    fn name(&self) -> &'static str;

    /// Record the intent to host `app`. No units are created.
    async fn provision(&self, app: &App) -> Result<()>;

    /// Launch a new unit for `app`, writing command output to `output`.
    async fn deploy(&self, app: &App, output: &mut (dyn Write + Send)) -> Result<()>;

    /// Tear down every unit of `app`. Record removal completes asynchronously.
    async fn destroy(&self, app: &App) -> Result<()>;

    /// Reserve `n` more units. Empty when `app` has no units yet.
    async fn add_units(&self, app: &App, n: usize) -> Result<Vec<Unit>>;

    /// Remove one unit, identified by unit name or instance id.
    async fn remove_unit(&self, app: &App, unit_id: &str) -> Result<()>;

    async fn restart(&self, app: &App) -> Result<()>;

    /// Run `cmd` inside every unit of `app`.
    async fn execute_command(
        &self,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
        app: &App,
        cmd: &str,
        args: &[String],
    ) -> Result<()>;

    /// Address of the first unit of `app`.
    async fn addr(&self, app: &App) -> Result<String>;

    /// Observe the live state of every known unit.
    async fn collect_status(&self) -> Result<Vec<Unit>>;
}
