//! AWS (Amazon Web Services) endpoints.
//!
//! Implements [`ComputeApi`](crate::ComputeApi), [`ObjectStore`](crate::ObjectStore)
//! and [`LoadBalancerApi`](crate::LoadBalancerApi) for AWS.
//!
//! ## Services
//!
//! - **EC2** - instance descriptions (bootstrap identity, private DNS names)
//! - **S3** - the provider-state blob of the coordination layer
//! - **ELB** - per-instance health of application load balancers

mod client;
mod models;

pub use client::Aws;
pub use models::*;
