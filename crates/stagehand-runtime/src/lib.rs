//! Deployment environments for Stagehand.
//!
//! An [`environment::Environment`] accepts deployment descriptors, starts
//! the resources the application declares, and resolves them by symbolic
//! name afterwards. [`engine::Deployer`] is the driver most callers use.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod destination;
pub mod engine;
pub mod environment;
pub mod error;
pub mod handle;
pub mod resource;
pub mod state;
