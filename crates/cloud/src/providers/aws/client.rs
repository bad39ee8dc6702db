//! AWS API client implementation.
//!
//! One client covers the three endpoints the healers use: EC2 for
//! instance lookups, S3 for the provider-state blob and classic ELB for
//! instance health. Requests carry the account's access key; request
//! signing is delegated to the endpoint gateway configured for the
//! platform.

use std::time::Duration;

use async_trait::async_trait;
use drydock_config::AwsConfig;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::models::{
    DescribeInstanceHealthRequest, DescribeInstanceHealthResponse, DescribeInstancesRequest,
    DescribeInstancesResponse, DescribeLoadBalancersRequest, DescribeLoadBalancersResponse,
    Ec2Reservation,
};
use crate::providers::traits::{
    CloudError, ComputeApi, ComputeInstance, InstanceHealth, LoadBalancerApi, ObjectStore,
    Reservation,
};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const EC2_API_VERSION: &str = "2016-11-15";
const ELB_API_VERSION: &str = "2012-06-01";

/// AWS cloud endpoints.
#[derive(Clone)]
pub struct Aws {
    client: Client,
    access_key_id: String,
    #[allow(dead_code)]
    secret_access_key: String,
    ec2_endpoint: String,
    s3_endpoint: String,
    elb_endpoint: String,
}

impl Aws {
    /// Create a client for the default endpoints of `region`.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: &str,
    ) -> Result<Self, CloudError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(CloudError::Http)?;

        Ok(Self {
            client,
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            ec2_endpoint: format!("https://ec2.{region}.amazonaws.com"),
            s3_endpoint: format!("https://s3.{region}.amazonaws.com"),
            elb_endpoint: format!("https://elasticloadbalancing.{region}.amazonaws.com"),
        })
    }

    /// Build a client from platform configuration.
    ///
    /// Fails with [`CloudError::Config`] naming the missing key when the
    /// credentials are absent.
    pub fn from_config(config: &AwsConfig) -> Result<Self, CloudError> {
        let (access, secret) = config
            .credentials()
            .map_err(|e| CloudError::Config(e.to_string()))?;
        Ok(Self::new(access, secret, &config.region)?
            .with_ec2_endpoint(config.ec2_endpoint())
            .with_s3_endpoint(config.s3_endpoint())
            .with_elb_endpoint(config.elb_endpoint()))
    }

    #[must_use]
    pub fn with_ec2_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.ec2_endpoint = trim_endpoint(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_s3_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.s3_endpoint = trim_endpoint(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_elb_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.elb_endpoint = trim_endpoint(endpoint.into());
        self
    }

    /// Execute a JSON API request.
    async fn aws_request<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, CloudError> {
        debug!(url = %url, "AWS request");

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header(
                "X-Amz-Date",
                chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string(),
            )
            .header("X-Amz-Access-Key", &self.access_key_id)
            .json(body)
            .send()
            .await?;

        let text = Self::checked_body(response).await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "Failed to parse response");
            CloudError::Serialization(e)
        })
    }

    /// Map non-success statuses onto [`CloudError`] and return the body.
    async fn checked_body(response: reqwest::Response) -> Result<String, CloudError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else if status == StatusCode::NOT_FOUND {
            Err(CloudError::NotFound(text))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(CloudError::Auth(text))
        } else {
            Err(CloudError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    fn to_reservation(reservation: Ec2Reservation) -> Reservation {
        Reservation {
            security_groups: reservation
                .groups
                .into_iter()
                .map(|g| g.group_name)
                .collect(),
            instances: reservation
                .instances
                .into_iter()
                .map(|i| ComputeInstance {
                    instance_id: i.instance_id,
                    private_dns_name: i.private_dns_name,
                    state: i.state.map(|s| s.name).unwrap_or_default(),
                })
                .collect(),
        }
    }
}

fn trim_endpoint(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

#[async_trait]
impl ComputeApi for Aws {
    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<Reservation>, CloudError> {
        let url = format!(
            "{}/?Action=DescribeInstances&Version={EC2_API_VERSION}",
            self.ec2_endpoint
        );
        let body = DescribeInstancesRequest {
            instance_ids: ids.to_vec(),
        };
        let response: DescribeInstancesResponse = self.aws_request(&url, &body).await?;
        Ok(response
            .reservations
            .into_iter()
            .map(Self::to_reservation)
            .collect())
    }
}

#[async_trait]
impl ObjectStore for Aws {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, CloudError> {
        let url = format!("{}/{bucket}/{key}", self.s3_endpoint);
        debug!(url = %url, "S3 get");
        let response = self
            .client
            .get(&url)
            .header("X-Amz-Access-Key", &self.access_key_id)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes().await?.to_vec());
        }
        Err(Self::checked_body(response).await.err().unwrap_or(CloudError::Api {
            status: status.as_u16(),
            message: String::new(),
        }))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), CloudError> {
        let url = format!("{}/{bucket}/{key}", self.s3_endpoint);
        debug!(url = %url, bytes = data.len(), "S3 put");
        let response = self
            .client
            .put(&url)
            .header("Content-Type", content_type)
            .header("x-amz-acl", "bucket-owner-full-control")
            .header("X-Amz-Access-Key", &self.access_key_id)
            .body(data)
            .send()
            .await?;
        Self::checked_body(response).await.map(|_| ())
    }
}

#[async_trait]
impl LoadBalancerApi for Aws {
    async fn describe_load_balancers(&self, names: &[String]) -> Result<Vec<String>, CloudError> {
        let url = format!(
            "{}/?Action=DescribeLoadBalancers&Version={ELB_API_VERSION}",
            self.elb_endpoint
        );
        let body = DescribeLoadBalancersRequest {
            load_balancer_names: names.to_vec(),
        };
        let response: DescribeLoadBalancersResponse = self.aws_request(&url, &body).await?;
        Ok(response
            .load_balancer_descriptions
            .into_iter()
            .map(|d| d.load_balancer_name)
            .collect())
    }

    async fn describe_instance_health(&self, lb: &str) -> Result<Vec<InstanceHealth>, CloudError> {
        let url = format!(
            "{}/?Action=DescribeInstanceHealth&Version={ELB_API_VERSION}",
            self.elb_endpoint
        );
        let body = DescribeInstanceHealthRequest {
            load_balancer_name: lb.to_string(),
        };
        let response: DescribeInstanceHealthResponse = self.aws_request(&url, &body).await?;
        Ok(response
            .instance_states
            .into_iter()
            .map(|s| InstanceHealth {
                instance_id: s.instance_id,
                state: s.state,
                reason_code: s.reason_code,
                description: s.description,
            })
            .collect())
    }
}
