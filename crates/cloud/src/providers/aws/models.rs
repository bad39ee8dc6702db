//! AWS API request and response models.

use serde::{Deserialize, Serialize};

// ============================================================================
// EC2
// ============================================================================

/// EC2 `DescribeInstances` request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeInstancesRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instance_ids: Vec<String>,
}

/// EC2 `DescribeInstances` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeInstancesResponse {
    #[serde(default)]
    pub reservations: Vec<Ec2Reservation>,
}

/// A reservation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ec2Reservation {
    /// Security groups.
    #[serde(default)]
    pub groups: Vec<GroupIdentifier>,
    #[serde(default)]
    pub instances: Vec<Ec2Instance>,
}

/// Security group reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupIdentifier {
    #[serde(default)]
    pub group_id: String,
    pub group_name: String,
}

/// EC2 instance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ec2Instance {
    pub instance_id: String,
    #[serde(default)]
    pub private_dns_name: String,
    #[serde(default)]
    pub state: Option<InstanceState>,
}

/// Instance state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceState {
    pub code: i32,
    pub name: String,
}

// ============================================================================
// ELB
// ============================================================================

/// ELB `DescribeLoadBalancers` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeLoadBalancersRequest {
    pub load_balancer_names: Vec<String>,
}

/// ELB `DescribeLoadBalancers` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeLoadBalancersResponse {
    #[serde(default)]
    pub load_balancer_descriptions: Vec<LoadBalancerDescription>,
}

/// Load balancer description.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancerDescription {
    pub load_balancer_name: String,
    #[serde(default, rename = "DNSName")]
    pub dns_name: String,
}

/// ELB `DescribeInstanceHealth` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeInstanceHealthRequest {
    pub load_balancer_name: String,
}

/// ELB `DescribeInstanceHealth` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeInstanceHealthResponse {
    #[serde(default)]
    pub instance_states: Vec<ElbInstanceState>,
}

/// Health of an instance behind a load balancer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ElbInstanceState {
    pub instance_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub reason_code: String,
    #[serde(default)]
    pub description: String,
}
