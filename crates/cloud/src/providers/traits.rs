//! Cloud endpoint traits and common types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to a cloud endpoint.
#[derive(Error, Debug)]
pub enum CloudError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid or missing configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CloudError {
    /// Whether the failure happened before an API answer was received.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect() || e.is_timeout() || e.is_request())
    }
}

// ============================================================================
// Compute
// ============================================================================

/// A reservation groups instances launched together, with their security groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Names of the security groups attached to the reservation.
    pub security_groups: Vec<String>,
    pub instances: Vec<ComputeInstance>,
}

/// A compute instance as seen by the healers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeInstance {
    pub instance_id: String,
    pub private_dns_name: String,
    pub state: String,
}

/// Compute API: list and describe instances.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Describe the given instances, or every instance when `ids` is empty.
    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<Reservation>, CloudError>;
}

// ============================================================================
// Object store
// ============================================================================

/// Object store API: read and write small blobs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, CloudError>;

    /// Write `data` with the given content type, owned by the bucket owner.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), CloudError>;
}

// ============================================================================
// Load balancer
// ============================================================================

/// Health of one instance registered in a load balancer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceHealth {
    pub instance_id: String,
    pub state: String,
    pub reason_code: String,
    pub description: String,
}

/// Load balancer API: describe balancers and their instances' health.
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    /// Names of the balancers that exist among `names`.
    async fn describe_load_balancers(&self, names: &[String]) -> Result<Vec<String>, CloudError>;

    async fn describe_instance_health(&self, lb: &str) -> Result<Vec<InstanceHealth>, CloudError>;
}
