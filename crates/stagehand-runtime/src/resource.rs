//! Deployed resources and their lifecycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use stagehand_common::types::{DeploymentId, ResourceName, ResourceState};
use stagehand_descriptor::manifest::DestinationSpec;
use stagehand_descriptor::resolver::ResolvedService;

use crate::destination::{DestinationCore, QueueHandle, TopicHandle};
use crate::error::{DeploymentError, Result};
use crate::handle::{ResourceHandle, ServiceHandle};

/// A service instance with its injected environment.
#[derive(Debug)]
pub struct Service {
    /// Service name.
    pub name: ResourceName,
    /// Current lifecycle state.
    pub state: ResourceState,
    env: Arc<BTreeMap<String, String>>,
    params: Arc<BTreeMap<String, String>>,
    missing_env: Vec<String>,
}

impl Service {
    /// Creates a stopped service from its resolved declaration.
    #[must_use]
    pub fn new(resolved: ResolvedService) -> Self {
        Self {
            name: resolved.name,
            state: ResourceState::Stopped,
            env: Arc::new(resolved.env),
            params: Arc::new(resolved.params),
            missing_env: resolved.missing_env,
        }
    }

    /// Starts the service, transitioning to `Started`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is already started or a required
    /// environment variable was not injected.
    pub fn start(&mut self) -> Result<()> {
        if self.state == ResourceState::Started {
            return Err(DeploymentError::StartFailed {
                resource: self.name.clone(),
                reason: "already started".into(),
            });
        }
        if !self.missing_env.is_empty() {
            return Err(DeploymentError::StartFailed {
                resource: self.name.clone(),
                reason: format!(
                    "missing required environment variable(s): {}",
                    self.missing_env.join(", ")
                ),
            });
        }
        self.state = ResourceState::Started;
        tracing::info!(service = %self.name, "service started");
        Ok(())
    }

    /// Stops the service, transitioning to `Stopped`.
    pub fn stop(&mut self) {
        self.state = ResourceState::Stopped;
        tracing::info!(service = %self.name, "service stopped");
    }
}

/// Any resource owned by a deployment.
#[derive(Debug)]
pub enum Resource {
    /// A service.
    Service(Service),
    /// A queue or topic.
    Destination(Arc<DestinationCore>),
}

impl Resource {
    /// Creates a stopped destination from its declaration.
    #[must_use]
    pub fn destination(spec: &DestinationSpec) -> Self {
        Self::Destination(Arc::new(DestinationCore::new(spec.name.clone(), spec.durable)))
    }

    /// Resource name.
    #[must_use]
    pub fn name(&self) -> &ResourceName {
        match self {
            Self::Service(s) => &s.name,
            Self::Destination(d) => d.name(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ResourceState {
        match self {
            Self::Service(s) => s.state,
            Self::Destination(d) => d.state(),
        }
    }

    /// Starts the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot start.
    pub fn start(&mut self) -> Result<()> {
        match self {
            Self::Service(s) => s.start(),
            Self::Destination(d) => {
                d.start();
                Ok(())
            }
        }
    }

    /// Stops the resource.
    pub fn stop(&mut self) {
        match self {
            Self::Service(s) => s.stop(),
            Self::Destination(d) => d.stop(),
        }
    }

    /// Returns a handle if the resource is started.
    #[must_use]
    pub fn handle(&self, deployment: &DeploymentId) -> Option<ResourceHandle> {
        if self.state() != ResourceState::Started {
            return None;
        }
        let handle = match self {
            Self::Service(s) => ResourceHandle::Service(ServiceHandle {
                name: s.name.clone(),
                deployment: deployment.clone(),
                env: Arc::clone(&s.env),
                params: Arc::clone(&s.params),
            }),
            Self::Destination(d) => match d.name() {
                ResourceName::Queue(_) => ResourceHandle::Queue {
                    deployment: deployment.clone(),
                    queue: QueueHandle::new(Arc::clone(d)),
                },
                ResourceName::Topic(_) => ResourceHandle::Topic {
                    deployment: deployment.clone(),
                    topic: TopicHandle::new(Arc::clone(d)),
                },
                ResourceName::Service(_) => return None,
            },
        };
        Some(handle)
    }
}
