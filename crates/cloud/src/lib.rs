//! Cloud endpoints for the Drydock control plane.
//!
//! The healers only need a narrow slice of a cloud provider:
//!
//! - **Compute** - list and describe instances
//! - **Object store** - get and put a small state blob
//! - **Load balancer** - describe balancers and instance health
//!
//! Each slice is a trait so healers can be exercised against in-process
//! fakes; [`Aws`] implements all three over HTTP.

pub mod providers;

pub use providers::{
    aws, Aws, CloudError, ComputeApi, ComputeInstance, InstanceHealth, LoadBalancerApi,
    ObjectStore, Reservation,
};
