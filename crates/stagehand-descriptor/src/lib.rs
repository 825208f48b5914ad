//! # stagehand-descriptor
//!
//! Parsing and validation for the documents that drive a deployment.
//!
//! Handles:
//! - **Descriptor**: The immutable [`DeploymentDescriptor`](descriptor::DeploymentDescriptor) and its digest.
//! - **Parser**: YAML descriptor parsing and validation.
//! - **Manifest**: Resource declarations found inside an application root.
//! - **Graph**: Resource dependency graph and start ordering.
//! - **Resolver**: Environment injection into declared services.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod descriptor;
pub mod graph;
pub mod manifest;
pub mod parser;
pub mod resolver;
