//! Container-backed provisioner.
//!
//! Each unit is one container started by the runtime CLI
//! (`docker run -d -t -p <port> <image> /bin/bash -c "<deploy> && <run>"`).
//! The container id is the unit name. Unit and image records live in the
//! injected stores; nothing is cached here.

mod inspect;
mod status;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use drydock_config::DockerConfig;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::exec::{CommandOutput, Executor};
use crate::provisioner::Provisioner;
use crate::store::{ImageStore, UnitFilter, UnitStore};
use crate::unit::{App, Image, Unit, UnitStatus};
use crate::wait::{wait_for, POLL_INTERVAL};

pub use inspect::{ContainerInspect, NetworkSettings};
pub use status::persist_status;

/// Provisioner that runs each unit as a container.
#[derive(Clone)]
pub struct DockerProvisioner {
    config: DockerConfig,
    executor: Arc<dyn Executor>,
    units: Arc<dyn UnitStore>,
    images: Arc<dyn ImageStore>,
}

fn to_args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl DockerProvisioner {
    pub fn new(
        config: DockerConfig,
        executor: Arc<dyn Executor>,
        units: Arc<dyn UnitStore>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            config,
            executor,
            units,
            images,
        }
    }

    /// Build a provisioner over one store that keeps both units and images.
    pub fn with_store<S>(config: DockerConfig, executor: Arc<dyn Executor>, store: Arc<S>) -> Self
    where
        S: UnitStore + ImageStore + 'static,
    {
        Self::new(config, executor, store.clone(), store)
    }

    pub fn config(&self) -> &DockerConfig {
        &self.config
    }

    async fn docker(&self, args: Vec<String>) -> Result<CommandOutput> {
        self.executor.run(&self.config.binary, &args).await
    }

    async fn app_units(&self, app: &App) -> Result<Vec<Unit>> {
        self.units.find(&UnitFilter::by_app(&app.name)).await
    }

    /// The app's committed image once it exists, the platform image before.
    async fn image_for(&self, app: &App) -> Result<String> {
        let namespace = &self.config.repository_namespace;
        Ok(match self.images.find_image(&app.name).await? {
            Some(_) => format!("{namespace}/{}", app.name),
            None => format!("{namespace}/{}", app.platform),
        })
    }

    fn repository_url(&self, app: &App) -> String {
        format!("git://{}/{}.git", self.config.git_host, app.name)
    }

    async fn inspect(&self, id: &str) -> Result<ContainerInspect> {
        let output = self.docker(to_args(["inspect", id])).await?;
        ContainerInspect::parse(id, &output.stdout)
    }

    /// Wait until `app` has no unit records left, for at most the
    /// configured destroy timeout.
    pub async fn wait_destroyed(&self, app: &App) -> Result<()> {
        self.wait_destroyed_within(app, self.config.destroy_timeout())
            .await
    }

    pub async fn wait_destroyed_within(&self, app: &App, timeout: Duration) -> Result<()> {
        let filter = UnitFilter::by_app(&app.name);
        wait_for(
            &format!("units of {} to be removed", app.name),
            timeout,
            POLL_INTERVAL,
            || async { Ok::<_, Error>(self.units.find(&filter).await?.is_empty()) },
        )
        .await
    }
}

/// First machine index not held by any of `units`.
fn next_machine(units: &[Unit]) -> u32 {
    units
        .iter()
        .map(|u| u.machine.saturating_add(1))
        .max()
        .unwrap_or(0)
}

/// Stop and remove a container, then delete its record.
///
/// A missing container does not keep the record alive.
async fn remove_container(
    executor: &dyn Executor,
    units: &dyn UnitStore,
    binary: &str,
    unit: &Unit,
) -> Result<()> {
    for action in ["stop", "rm"] {
        if let Err(e) = executor.run(binary, &to_args([action, unit.name.as_str()])).await {
            warn!(unit = %unit.name, error = %e, "Failed to {action} container");
        }
    }
    units.delete(&unit.name).await?;
    Ok(())
}

#[async_trait]
impl Provisioner for DockerProvisioner {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn provision(&self, app: &App) -> Result<()> {
        if app.name.is_empty() || app.platform.is_empty() {
            return Err(Error::Parse {
                what: "application descriptor".to_string(),
                reason: "name and platform are required".to_string(),
            });
        }
        info!(app = %app.name, platform = %app.platform, "Provisioned app");
        Ok(())
    }

    async fn deploy(&self, app: &App, output: &mut (dyn Write + Send)) -> Result<()> {
        let image = self.image_for(app).await?;
        let container_cmd = format!(
            "{} {} && {} {}",
            self.config.deploy_script,
            self.repository_url(app),
            self.config.run_bin,
            self.config.run_args
        );
        info!(app = %app.name, image = %image, "Deploying app");

        let run = self
            .docker(to_args([
                "run",
                "-d",
                "-t",
                "-p",
                self.config.port.as_str(),
                image.as_str(),
                "/bin/bash",
                "-c",
                container_cmd.as_str(),
            ]))
            .await?;
        output.write_all(&run.stdout)?;
        output.write_all(&run.stderr)?;

        let stdout = run.stdout_lossy();
        let id = stdout
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .ok_or_else(|| Error::Parse {
                what: "run output".to_string(),
                reason: "no container id".to_string(),
            })?
            .to_string();

        let inspect = self.inspect(&id).await?;
        let machine = next_machine(&self.app_units(app).await?);
        self.units
            .insert(Unit {
                name: id.clone(),
                app_name: app.name.clone(),
                unit_type: app.platform.clone(),
                machine,
                ip: inspect.ip().to_string(),
                instance_id: String::new(),
                status: UnitStatus::Creating,
            })
            .await?;
        debug!(app = %app.name, container = %id, "Recorded unit");

        if self.images.find_image(&app.name).await?.is_none() {
            let image_name = format!("{}/{}", self.config.repository_namespace, app.name);
            let commit = self
                .docker(to_args(["commit", id.as_str(), image_name.as_str()]))
                .await?;
            output.write_all(&commit.stdout)?;
            self.images
                .insert_image(Image {
                    name: app.name.clone(),
                })
                .await?;
            info!(app = %app.name, image = %image_name, "Committed app image");
        }
        Ok(())
    }

    async fn destroy(&self, app: &App) -> Result<()> {
        let units = self.app_units(app).await?;
        if units.is_empty() {
            debug!(app = %app.name, "No units left, removing image record only");
            self.images.delete_image(&app.name).await?;
            return Ok(());
        }
        info!(app = %app.name, units = units.len(), "Destroying app");

        let executor = Arc::clone(&self.executor);
        let store = Arc::clone(&self.units);
        let images = Arc::clone(&self.images);
        let binary = self.config.binary.clone();
        let app_name = app.name.clone();
        tokio::spawn(async move {
            for unit in &units {
                if let Err(e) = remove_container(executor.as_ref(), store.as_ref(), &binary, unit).await {
                    warn!(unit = %unit.name, error = %e, "Failed to remove unit record");
                }
            }
            if let Err(e) = images.delete_image(&app_name).await {
                warn!(app = %app_name, error = %e, "Failed to remove image record");
            }
        });
        Ok(())
    }

    async fn add_units(&self, app: &App, n: usize) -> Result<Vec<Unit>> {
        let existing = self.app_units(app).await?;
        if existing.is_empty() {
            debug!(app = %app.name, "No units yet, deploy first");
            return Ok(Vec::new());
        }
        let first = next_machine(&existing);
        // Reserved only; containers are created by later deploys.
        Ok((0..n)
            .map(|i| u32::try_from(i).map_or(u32::MAX, |i| first.saturating_add(i)))
            .map(|slot| Unit {
                name: format!("{}/{slot}", app.name),
                app_name: app.name.clone(),
                unit_type: app.platform.clone(),
                machine: slot,
                status: UnitStatus::Creating,
                ..Unit::default()
            })
            .collect())
    }

    async fn remove_unit(&self, app: &App, unit_id: &str) -> Result<()> {
        let units = self.app_units(app).await?;
        if units.is_empty() {
            return Ok(());
        }
        let unit = units
            .iter()
            .find(|u| u.name == unit_id || (!u.instance_id.is_empty() && u.instance_id == unit_id))
            .ok_or_else(|| Error::NotFound(format!("unit {unit_id} of app {}", app.name)))?;
        info!(app = %app.name, unit = %unit.name, "Removing unit");
        remove_container(
            self.executor.as_ref(),
            self.units.as_ref(),
            &self.config.binary,
            unit,
        )
        .await
    }

    async fn restart(&self, app: &App) -> Result<()> {
        let units = self.app_units(app).await?;
        if units.is_empty() {
            return Err(Error::NotFound(format!("units of app {}", app.name)));
        }
        for unit in &units {
            info!(app = %app.name, unit = %unit.name, "Restarting unit");
            self.docker(to_args(["stop", unit.name.as_str()])).await?;
            self.docker(to_args(["start", unit.name.as_str()])).await?;
        }
        Ok(())
    }

    async fn execute_command(
        &self,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
        app: &App,
        cmd: &str,
        args: &[String],
    ) -> Result<()> {
        let units = self.app_units(app).await?;
        if units.is_empty() {
            return Err(Error::NotFound(format!("units of app {}", app.name)));
        }

        let mut failures = Vec::new();
        for unit in &units {
            let mut exec_args = to_args(["exec", unit.name.as_str(), cmd]);
            exec_args.extend(args.iter().cloned());
            match self.executor.execute(&self.config.binary, &exec_args).await {
                Ok(output) => {
                    stdout.write_all(&output.stdout)?;
                    stderr.write_all(&output.stderr)?;
                    if !output.success() {
                        warn!(unit = %unit.name, code = ?output.code, "Command failed in unit");
                        failures.push(format!("{}: exit {:?}", unit.name, output.code));
                    }
                }
                Err(e) => {
                    warn!(unit = %unit.name, error = %e, "Command failed in unit");
                    failures.push(format!("{}: {e}", unit.name));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Execution {
                command: format!("{cmd} {}", args.join(" ")).trim_end().to_string(),
                stderr: failures.join("; "),
            })
        }
    }

    async fn addr(&self, app: &App) -> Result<String> {
        self.app_units(app)
            .await?
            .into_iter()
            .next()
            .map(|u| u.ip)
            .ok_or_else(|| Error::NotFound(format!("units of app {}", app.name)))
    }

    async fn collect_status(&self) -> Result<Vec<Unit>> {
        status::collect(self).await
    }
}
