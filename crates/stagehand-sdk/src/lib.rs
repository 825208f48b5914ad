//! # stagehand-sdk
//!
//! Test-facing API for deploying applications and asserting that their
//! resources resolve.
//!
//! Provides two entry points:
//! - [`DescriptorBuilder`](builder::DescriptorBuilder): Fluent API for assembling deployment descriptors.
//! - [`Harness`](harness::Harness): Deploys descriptors, resolves resources, and undeploys on drop.
//!
//! # Example
//!
//! ```rust,no_run
//! use stagehand_sdk::builder::DescriptorBuilder;
//! use stagehand_sdk::harness::Harness;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let descriptor = DescriptorBuilder::new("apps/alacarte/services")
//!     .env("BASEDIR", "/srv/alacarte")
//!     .runtime_version("1.9")
//!     .build()?;
//!
//! let mut harness = Harness::local();
//! let _receipt = harness.deploy(&descriptor)?;
//! let _service = harness.expect("service:SimpleService")?;
//! let _queue = harness.expect("/queue/container_queue")?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod builder;
pub mod harness;
