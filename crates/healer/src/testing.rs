//! Fixtures and in-process cloud fakes shared by the healer tests.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use drydock_cloud::{
    CloudError, ComputeApi, ComputeInstance, InstanceHealth, LoadBalancerApi, ObjectStore,
    Reservation,
};
use provision::{App, Provisioner, Unit};

pub const STATUS: &str = r"machines:
  0:
    agent-state: running
    dns-name: 192.168.0.10
    instance-id: i-00000439
  1:
    agent-state: down
    dns-name: 192.168.0.11
    instance-id: i-0000043e
  2:
    agent-state: running
    dns-name: 192.168.0.12
    instance-id: i-0000043f
services:
  umaappqq:
    charm: local:oneiric/umaappqq-0
    relations: {}
    units:
      umaappqq/0:
        agent-state: down
        machine: 1
        public-address: 192.168.0.11
      umaappqq/1:
        agent-state: started
        machine: 2
        public-address: 192.168.0.12
";

/// A status snapshot with every agent healthy and the bootstrap machine in
/// `bootstrap_state`.
pub fn healthy_status(bootstrap_state: &str) -> String {
    format!(
        "machines:
  0:
    agent-state: {bootstrap_state}
    dns-name: 192.168.0.10
    instance-id: i-00000439
  1:
    agent-state: running
    dns-name: 192.168.0.11
    instance-id: i-0000043e
services:
  umaappqq:
    units:
      umaappqq/0:
        agent-state: started
        machine: 1
        public-address: 192.168.0.11
"
    )
}

/// The ssh arguments remote remediation uses for `host`.
pub fn ssh(host: &str, remote: &[&str]) -> Vec<String> {
    ["-o", "StrictHostKeyChecking no", "-q", "-l", "ubuntu", host]
        .iter()
        .chain(remote)
        .map(|s| (*s).to_string())
        .collect()
}

#[derive(Default)]
pub struct FakeCompute {
    pub reservations: Vec<Reservation>,
    pub fail: bool,
    pub requests: Mutex<Vec<Vec<String>>>,
}

impl FakeCompute {
    pub fn with_instance(group: &str, id: &str, dns: &str) -> Self {
        Self {
            reservations: vec![Reservation {
                security_groups: vec![group.to_string()],
                instances: vec![ComputeInstance {
                    instance_id: id.to_string(),
                    private_dns_name: dns.to_string(),
                    state: "running".to_string(),
                }],
            }],
            ..Self::default()
        }
    }
}

#[async_trait]
impl ComputeApi for FakeCompute {
    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<Reservation>, CloudError> {
        if let Ok(mut r) = self.requests.lock() {
            r.push(ids.to_vec());
        }
        if self.fail {
            return Err(CloudError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        if ids.is_empty() {
            return Ok(self.reservations.clone());
        }
        Ok(self
            .reservations
            .iter()
            .filter(|r| r.instances.iter().any(|i| ids.contains(&i.instance_id)))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeObjects {
    pub objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    pub puts: Mutex<Vec<(String, String, Vec<u8>, String)>>,
}

impl FakeObjects {
    pub fn with_object(bucket: &str, key: &str, data: &str) -> Self {
        let fake = Self::default();
        if let Ok(mut o) = fake.objects.lock() {
            o.insert((bucket.to_string(), key.to_string()), data.as_bytes().to_vec());
        }
        fake
    }

    pub fn puts(&self) -> Vec<(String, String, Vec<u8>, String)> {
        self.puts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for FakeObjects {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, CloudError> {
        self.objects
            .lock()
            .ok()
            .and_then(|o| o.get(&(bucket.to_string(), key.to_string())).cloned())
            .ok_or_else(|| CloudError::NotFound(format!("{bucket}/{key}")))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), CloudError> {
        if let Ok(mut p) = self.puts.lock() {
            p.push((
                bucket.to_string(),
                key.to_string(),
                data.clone(),
                content_type.to_string(),
            ));
        }
        if let Ok(mut o) = self.objects.lock() {
            o.insert((bucket.to_string(), key.to_string()), data);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeBalancers {
    pub health: HashMap<String, Vec<InstanceHealth>>,
    pub described: Mutex<Vec<Vec<String>>>,
}

impl FakeBalancers {
    pub fn with_health(lb: &str, health: Vec<InstanceHealth>) -> Self {
        let mut fake = Self::default();
        fake.health.insert(lb.to_string(), health);
        fake
    }

    pub fn described(&self) -> Vec<Vec<String>> {
        self.described.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LoadBalancerApi for FakeBalancers {
    async fn describe_load_balancers(&self, names: &[String]) -> Result<Vec<String>, CloudError> {
        if let Ok(mut d) = self.described.lock() {
            d.push(names.to_vec());
        }
        Ok(names
            .iter()
            .filter(|n| self.health.contains_key(n.as_str()))
            .cloned()
            .collect())
    }

    async fn describe_instance_health(&self, lb: &str) -> Result<Vec<InstanceHealth>, CloudError> {
        self.health
            .get(lb)
            .cloned()
            .ok_or_else(|| CloudError::NotFound(lb.to_string()))
    }
}

/// Provisioner that records every call as `<op> <app> [args]` and succeeds.
#[derive(Default)]
pub struct RecordingProvisioner {
    pub calls: Mutex<Vec<String>>,
}

impl RecordingProvisioner {
    fn record(&self, call: String) {
        if let Ok(mut c) = self.calls.lock() {
            c.push(call);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Provisioner for RecordingProvisioner {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn provision(&self, app: &App) -> provision::Result<()> {
        self.record(format!("provision {}", app.name));
        Ok(())
    }

    async fn deploy(&self, app: &App, _output: &mut (dyn Write + Send)) -> provision::Result<()> {
        self.record(format!("deploy {}", app.name));
        Ok(())
    }

    async fn destroy(&self, app: &App) -> provision::Result<()> {
        self.record(format!("destroy {}", app.name));
        Ok(())
    }

    async fn add_units(&self, app: &App, n: usize) -> provision::Result<Vec<Unit>> {
        self.record(format!("add_units {} {n}", app.name));
        Ok((0..n)
            .map(|i| Unit {
                name: format!("{}/{i}", app.name),
                app_name: app.name.clone(),
                ..Unit::default()
            })
            .collect())
    }

    async fn remove_unit(&self, app: &App, unit_id: &str) -> provision::Result<()> {
        self.record(format!("remove_unit {} {unit_id}", app.name));
        Ok(())
    }

    async fn restart(&self, app: &App) -> provision::Result<()> {
        self.record(format!("restart {}", app.name));
        Ok(())
    }

    async fn execute_command(
        &self,
        _stdout: &mut (dyn Write + Send),
        _stderr: &mut (dyn Write + Send),
        app: &App,
        cmd: &str,
        _args: &[String],
    ) -> provision::Result<()> {
        self.record(format!("execute_command {} {cmd}", app.name));
        Ok(())
    }

    async fn addr(&self, app: &App) -> provision::Result<String> {
        self.record(format!("addr {}", app.name));
        Ok(String::new())
    }

    async fn collect_status(&self) -> provision::Result<Vec<Unit>> {
        self.record("collect_status".to_string());
        Ok(Vec::new())
    }
}
