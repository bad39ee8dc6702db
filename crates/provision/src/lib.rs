//! # Provision
//!
//! Turns application requests into running units and reports their state.
//!
//! This crate provides:
//! - The [`Provisioner`] capability set
//! - [`DockerProvisioner`], which backs each unit with a container
//! - Unit and image stores (in-memory and JSON file)
//! - A command [`Executor`] seam so no operation shells out directly
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use provision::{App, DockerProvisioner, FileStore, Provisioner, SystemExecutor};
//!
//! let store = Arc::new(FileStore::new("units.json"));
//! let p = DockerProvisioner::with_store(config.docker, Arc::new(SystemExecutor::default()), store);
//! p.deploy(&App::new("myapp", "python"), &mut std::io::stdout()).await?;
//! ```

pub mod docker;
pub mod error;
pub mod exec;
pub mod provisioner;
pub mod store;
pub mod unit;
pub mod wait;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use docker::{persist_status, DockerProvisioner};
pub use error::{Error, Result};
pub use exec::{CommandOutput, Executor, SystemExecutor};
pub use provisioner::Provisioner;
pub use store::{FileStore, ImageStore, MemoryStore, UnitFilter, UnitStore};
pub use unit::{App, Image, Unit, UnitStatus};
pub use wait::{wait_for, POLL_INTERVAL};
