//! Deployment error taxonomy.

use std::path::PathBuf;

use stagehand_common::error::StagehandError;
use stagehand_common::types::{DeploymentId, ResourceName};
use thiserror::Error;

/// Why a deployment or undeployment failed.
///
/// Lookup absence is never an error; `fetch` returns `None` instead.
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// The descriptor or the application manifest is malformed.
    #[error("malformed descriptor: {message}")]
    MalformedDescriptor {
        /// What is wrong with the document.
        message: String,
    },

    /// The application root does not exist or is not a directory.
    #[error("application root {} is unreachable: {reason}", .path.display())]
    UnreachableRoot {
        /// The root that was requested.
        path: PathBuf,
        /// Why it could not be used.
        reason: String,
    },

    /// The environment does not offer the requested runtime version.
    #[error("runtime version {requested} is not supported (supported: {supported})")]
    UnsupportedRuntime {
        /// Version requested by the descriptor.
        requested: String,
        /// Comma-separated versions the environment accepts.
        supported: String,
    },

    /// A declared resource already belongs to another deployment.
    #[error("resource {name} is already provided by deployment \"{owner}\"")]
    ResourceConflict {
        /// The contested resource.
        name: ResourceName,
        /// Name of the deployment owning it.
        owner: String,
    },

    /// A resource could not be started.
    #[error("resource {resource} failed to start: {reason}")]
    StartFailed {
        /// The resource that failed.
        resource: ResourceName,
        /// Why it failed.
        reason: String,
    },

    /// No deployment with this id exists.
    #[error("deployment not found: {id}")]
    NotDeployed {
        /// The unknown id.
        id: DeploymentId,
    },

    /// Any other workspace error.
    #[error(transparent)]
    Common(StagehandError),
}

impl From<StagehandError> for DeploymentError {
    fn from(err: StagehandError) -> Self {
        match err {
            StagehandError::Descriptor { message } => Self::MalformedDescriptor { message },
            StagehandError::InvalidResourceName { .. } | StagehandError::Yaml { .. } => {
                Self::MalformedDescriptor {
                    message: err.to_string(),
                }
            }
            other => Self::Common(other),
        }
    }
}

/// Convenience alias for deployment operations.
pub type Result<T> = std::result::Result<T, DeploymentError>;
