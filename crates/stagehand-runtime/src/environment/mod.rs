//! Deployment environment abstraction.
//!
//! The [`Environment`] trait is the seam between the deployment driver and
//! whatever actually hosts applications. [`local::LocalEnvironment`] hosts
//! them in-process; test suites may supply their own implementations.

pub mod local;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stagehand_common::types::{DeploymentId, ResourceName};
use stagehand_descriptor::descriptor::DeploymentDescriptor;

use crate::error::{DeploymentError, Result};
use crate::handle::ResourceHandle;

/// Record of one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    /// Unique identifier.
    pub id: DeploymentId,
    /// Deployment name.
    pub name: String,
    /// Digest of the deployed descriptor.
    pub digest: String,
    /// Application root.
    pub application_root: PathBuf,
    /// Runtime version the application runs on.
    pub runtime: String,
    /// Resources in start order.
    pub resources: Vec<ResourceName>,
    /// RFC 3339 timestamp of the deployment.
    pub deployed_at: String,
}

/// What a successful `deploy` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// A new deployment was created.
    Created,
    /// An identical descriptor was already deployed; nothing changed.
    Unchanged,
    /// A deployment of the same name was replaced.
    Replaced {
        /// Id of the deployment that was replaced.
        previous: DeploymentId,
    },
}

/// Result of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReceipt {
    /// The deployment now in place.
    pub summary: DeploymentSummary,
    /// What the call changed.
    pub outcome: DeployOutcome,
}

impl DeploymentReceipt {
    /// Id of the deployment now in place.
    #[must_use]
    pub const fn id(&self) -> &DeploymentId {
        &self.summary.id
    }
}

/// Static facts about an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentInfo {
    /// Human-readable environment name.
    pub name: String,
    /// Runtime versions the environment accepts.
    pub supported_runtimes: Vec<String>,
    /// Runtime used when a descriptor gives no hint.
    pub default_runtime: String,
}

/// A place applications can be deployed to and resources looked up in.
///
/// Implementors must make `deploy` all-or-nothing: after a failed call no
/// resource declared by the failed descriptor is resolvable.
pub trait Environment: Send + Sync {
    /// Describes the environment.
    fn info(&self) -> EnvironmentInfo;

    /// Deploys a descriptor, blocking until every resource has started.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is malformed, the application root
    /// is unreachable, the runtime is unsupported, a resource conflicts with
    /// another deployment, or a resource fails to start.
    fn deploy(&self, descriptor: &DeploymentDescriptor) -> Result<DeploymentReceipt>;

    /// Stops and removes a deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if no deployment has this id.
    fn undeploy(&self, id: &DeploymentId) -> Result<()>;

    /// Resolves a resource, returning `None` if it is not deployed and started.
    fn fetch(&self, name: &ResourceName) -> Option<ResourceHandle>;

    /// Lists current deployments.
    fn deployments(&self) -> Vec<DeploymentSummary>;
}

/// Picks the supported runtime matching `requested`, or `default` when no
/// version is requested.
///
/// A request matches a supported version when it is equal to it or
/// refines it (`1.9.3` matches `1.9`).
///
/// # Errors
///
/// Returns an error if no supported version matches.
pub fn resolve_runtime(
    requested: Option<&str>,
    supported: &[String],
    default: &str,
) -> Result<String> {
    let requested = requested.unwrap_or(default);
    supported
        .iter()
        .find(|s| {
            requested == s.as_str()
                || requested
                    .strip_prefix(s.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
        .cloned()
        .ok_or_else(|| DeploymentError::UnsupportedRuntime {
            requested: requested.to_string(),
            supported: supported.join(", "),
        })
}
