//! Shared configuration for the Drydock control plane.
//!
//! A single JSON document drives the container provisioner, the cloud
//! endpoints and the healers. Every section has defaults so an empty
//! document (`{}`) is a valid configuration; keys without a sensible
//! default (cloud credentials, the provider-state bucket) are only
//! checked when a component actually asks for them.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or reading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config file '{path}': {reason}")]
    Parse { path: String, reason: String },

    /// A required key is absent. The payload is the colon-separated key path.
    #[error("Missing configuration key '{0}'")]
    Missing(&'static str),
}

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PlatformConfig {
    pub docker: DockerConfig,
    pub aws: AwsConfig,
    pub juju: JujuConfig,
    pub healer: HealerConfig,
    pub store: StoreConfig,
}

impl PlatformConfig {
    /// Load configuration from a JSON file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_json(&content).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        config.apply_env(|key| std::env::var(key).ok());
        debug!(path = %path.display(), "Loaded platform configuration");
        Ok(config)
    }

    /// Parse configuration from a JSON string without touching the environment.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Overlay `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_REGION`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("AWS_ACCESS_KEY_ID").filter(|v| !v.is_empty()) {
            self.aws.access_key_id = Some(v);
        }
        if let Some(v) = lookup("AWS_SECRET_ACCESS_KEY").filter(|v| !v.is_empty()) {
            self.aws.secret_access_key = Some(v);
        }
        if let Some(v) = lookup("AWS_REGION").filter(|v| !v.is_empty()) {
            self.aws.region = v;
        }
    }
}

/// Container provisioner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DockerConfig {
    /// Container runtime binary.
    pub binary: String,
    /// Namespace prefix for platform and application images.
    pub repository_namespace: String,
    /// Host serving application git repositories.
    pub git_host: String,
    /// Script run inside new containers to fetch and install the app.
    pub deploy_script: String,
    /// Process supervisor started after the deploy script.
    pub run_bin: String,
    pub run_args: String,
    /// Exposed service port inside the container.
    pub port: String,
    pub command_timeout_secs: u64,
    /// Upper bound for waiting on asynchronous unit removal.
    pub destroy_timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            repository_namespace: "drydock".to_string(),
            git_host: "localhost".to_string(),
            deploy_script: "/var/lib/drydock/deploy".to_string(),
            run_bin: "/usr/local/bin/circusd".to_string(),
            run_args: "/etc/circus/circus.ini".to_string(),
            port: "8888".to_string(),
            command_timeout_secs: 120,
            destroy_timeout_secs: 10,
        }
    }
}

impl DockerConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn destroy_timeout(&self) -> Duration {
        Duration::from_secs(self.destroy_timeout_secs)
    }
}

/// Cloud credentials and endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AwsConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: String,
    pub ec2_endpoint: Option<String>,
    pub s3_endpoint: Option<String>,
    pub elb_endpoint: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            region: "us-east-1".to_string(),
            ec2_endpoint: None,
            s3_endpoint: None,
            elb_endpoint: None,
        }
    }
}

impl AwsConfig {
    /// Access key and secret, both required.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let access = self
            .access_key_id
            .as_deref()
            .ok_or(ConfigError::Missing("aws:access-key-id"))?;
        let secret = self
            .secret_access_key
            .as_deref()
            .ok_or(ConfigError::Missing("aws:secret-access-key"))?;
        Ok((access, secret))
    }

    pub fn ec2_endpoint(&self) -> String {
        self.ec2_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://ec2.{}.amazonaws.com", self.region))
    }

    pub fn s3_endpoint(&self) -> String {
        self.s3_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", self.region))
    }

    pub fn elb_endpoint(&self) -> String {
        self.elb_endpoint.clone().unwrap_or_else(|| {
            format!("https://elasticloadbalancing.{}.amazonaws.com", self.region)
        })
    }
}

/// Coordination layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct JujuConfig {
    pub binary: String,
    /// Object-store bucket holding the provider-state blob.
    pub bucket: Option<String>,
    pub use_elb: bool,
    /// Security group that identifies the bootstrap instance.
    pub bootstrap_group: String,
    /// Administrative user for remote remediation.
    pub ssh_user: String,
    pub zookeeper_port: u16,
    pub probe_timeout_secs: u64,
}

impl Default for JujuConfig {
    fn default() -> Self {
        Self {
            binary: "juju".to_string(),
            bucket: None,
            use_elb: false,
            bootstrap_group: "juju-delta-0".to_string(),
            ssh_user: "ubuntu".to_string(),
            zookeeper_port: 2181,
            probe_timeout_secs: 5,
        }
    }
}

impl JujuConfig {
    pub fn bucket(&self) -> Result<&str, ConfigError> {
        self.bucket.as_deref().ok_or(ConfigError::Missing("juju:bucket"))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// HTTP trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HealerConfig {
    pub listen: String,
}

impl Default for HealerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8081".to_string(),
        }
    }
}

/// Unit store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "drydock-units.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = PlatformConfig::from_json("{}").unwrap();
        assert_eq!(config.docker.binary, "docker");
        assert_eq!(config.docker.deploy_script, "/var/lib/drydock/deploy");
        assert_eq!(config.docker.port, "8888");
        assert_eq!(config.juju.zookeeper_port, 2181);
        assert_eq!(config.juju.ssh_user, "ubuntu");
        assert!(!config.juju.use_elb);
        assert_eq!(config.aws.region, "us-east-1");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = PlatformConfig::from_json(
            r#"{"docker": {"repository-namespace": "base", "port": "8080"}, "juju": {"use-elb": true}}"#,
        )
        .unwrap();
        assert_eq!(config.docker.repository_namespace, "base");
        assert_eq!(config.docker.port, "8080");
        assert_eq!(config.docker.run_bin, "/usr/local/bin/circusd");
        assert!(config.juju.use_elb);
        assert_eq!(config.juju.bootstrap_group, "juju-delta-0");
    }

    #[test]
    fn test_missing_credentials_name_the_key() {
        let config = PlatformConfig::default();
        let err = config.aws.credentials().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("aws:access-key-id")));

        let mut config = PlatformConfig::default();
        config.aws.access_key_id = Some("key".to_string());
        let err = config.aws.credentials().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("aws:secret-access-key")));

        assert!(matches!(
            config.juju.bucket(),
            Err(ConfigError::Missing("juju:bucket"))
        ));
    }

    #[test]
    fn test_env_overrides_credentials_and_region() {
        let env: HashMap<&str, &str> = [
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_REGION", "sa-east-1"),
        ]
        .into_iter()
        .collect();
        let mut config = PlatformConfig::default();
        config.apply_env(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.aws.credentials().unwrap(), ("AKIA", "secret"));
        assert_eq!(config.aws.ec2_endpoint(), "https://ec2.sa-east-1.amazonaws.com");
    }

    #[test]
    fn test_explicit_endpoint_wins_over_region() {
        let config =
            PlatformConfig::from_json(r#"{"aws": {"ec2-endpoint": "http://localhost:4566"}}"#)
                .unwrap();
        assert_eq!(config.aws.ec2_endpoint(), "http://localhost:4566");
        assert_eq!(config.aws.s3_endpoint(), "https://s3.us-east-1.amazonaws.com");
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = PlatformConfig::load(file.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => {
                assert_eq!(path, file.path().display().to_string());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = PlatformConfig::load("/nonexistent/drydock.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
