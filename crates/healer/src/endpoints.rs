//! Cloud endpoints shared by the cloud-facing healers.
//!
//! Credentials are optional at startup. A healer that needs an endpoint
//! which is not configured fails with `ConfigurationMissing`; the others
//! keep running.

use std::sync::Arc;

use drydock_cloud::{Aws, ComputeApi, LoadBalancerApi, ObjectStore};
use drydock_config::{AwsConfig, ConfigError};
use tracing::info;

use crate::error::{HealError, Result};

#[derive(Clone, Default)]
pub struct CloudEndpoints {
    compute: Option<Arc<dyn ComputeApi>>,
    objects: Option<Arc<dyn ObjectStore>>,
    balancers: Option<Arc<dyn LoadBalancerApi>>,
    /// Key reported when an endpoint is requested but absent.
    missing: Option<String>,
}

impl CloudEndpoints {
    /// No endpoints at all.
    pub fn unconfigured(missing: impl Into<String>) -> Self {
        Self {
            missing: Some(missing.into()),
            ..Self::default()
        }
    }

    pub fn from_config(config: &AwsConfig) -> Result<Self> {
        if let Err(ConfigError::Missing(key)) = config.credentials() {
            info!(key, "Cloud credentials not configured, cloud healers disabled");
            return Ok(Self::unconfigured(key));
        }
        let aws = Arc::new(Aws::from_config(config)?);
        Ok(Self {
            compute: Some(aws.clone()),
            objects: Some(aws.clone()),
            balancers: Some(aws),
            missing: None,
        })
    }

    #[must_use]
    pub fn with_compute(mut self, compute: Arc<dyn ComputeApi>) -> Self {
        self.compute = Some(compute);
        self
    }

    #[must_use]
    pub fn with_objects(mut self, objects: Arc<dyn ObjectStore>) -> Self {
        self.objects = Some(objects);
        self
    }

    #[must_use]
    pub fn with_balancers(mut self, balancers: Arc<dyn LoadBalancerApi>) -> Self {
        self.balancers = Some(balancers);
        self
    }

    fn missing(&self) -> HealError {
        HealError::ConfigurationMissing(
            self.missing
                .clone()
                .unwrap_or_else(|| "aws:access-key-id".to_string()),
        )
    }

    pub fn compute(&self) -> Result<Arc<dyn ComputeApi>> {
        self.compute.clone().ok_or_else(|| self.missing())
    }

    pub fn objects(&self) -> Result<Arc<dyn ObjectStore>> {
        self.objects.clone().ok_or_else(|| self.missing())
    }

    pub fn balancers(&self) -> Result<Arc<dyn LoadBalancerApi>> {
        self.balancers.clone().ok_or_else(|| self.missing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCompute;

    #[test]
    fn test_missing_credentials_disable_endpoints() {
        let endpoints = CloudEndpoints::from_config(&AwsConfig::default()).unwrap();
        match endpoints.compute() {
            Err(HealError::ConfigurationMissing(key)) => assert_eq!(key, "aws:access-key-id"),
            _ => panic!("expected missing configuration"),
        }
        assert!(endpoints.objects().is_err());
        assert!(endpoints.balancers().is_err());
    }

    #[test]
    fn test_configured_credentials_enable_endpoints() {
        let config = AwsConfig {
            access_key_id: Some("AKIA".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..AwsConfig::default()
        };
        let endpoints = CloudEndpoints::from_config(&config).unwrap();
        assert!(endpoints.compute().is_ok());
        assert!(endpoints.objects().is_ok());
        assert!(endpoints.balancers().is_ok());
    }

    #[test]
    fn test_partial_endpoints() {
        let endpoints = CloudEndpoints::unconfigured("aws:secret-access-key")
            .with_compute(Arc::new(FakeCompute::default()));
        assert!(endpoints.compute().is_ok());
        match endpoints.objects() {
            Err(HealError::ConfigurationMissing(key)) => assert_eq!(key, "aws:secret-access-key"),
            _ => panic!("expected missing configuration"),
        }
    }
}
