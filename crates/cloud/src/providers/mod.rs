//! Cloud endpoint abstractions.
//!
//! This module defines the common traits and types for cloud endpoints.

pub mod aws;
mod traits;

pub use traits::{
    CloudError, ComputeApi, ComputeInstance, InstanceHealth, LoadBalancerApi, ObjectStore,
    Reservation,
};

pub use aws::Aws;
