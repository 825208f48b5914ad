//! Handles returned by resource lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use stagehand_common::types::{DeploymentId, ResourceKind, ResourceName};
use stagehand_descriptor::resolver::APP_ENV_VAR;

pub use crate::destination::{QueueHandle, Subscription, TopicHandle};

/// A resolved resource.
#[derive(Debug, Clone)]
pub enum ResourceHandle {
    /// A started service.
    Service(ServiceHandle),
    /// A started queue.
    Queue {
        /// Owning deployment.
        deployment: DeploymentId,
        /// The queue itself.
        queue: QueueHandle,
    },
    /// A started topic.
    Topic {
        /// Owning deployment.
        deployment: DeploymentId,
        /// The topic itself.
        topic: TopicHandle,
    },
}

impl ResourceHandle {
    /// Name the handle was resolved under.
    #[must_use]
    pub fn name(&self) -> &ResourceName {
        match self {
            Self::Service(s) => &s.name,
            Self::Queue { queue, .. } => queue.name(),
            Self::Topic { topic, .. } => topic.name(),
        }
    }

    /// Kind of the resource.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.name().kind()
    }

    /// Deployment that provides the resource.
    #[must_use]
    pub const fn deployment(&self) -> &DeploymentId {
        match self {
            Self::Service(s) => &s.deployment,
            Self::Queue { deployment, .. } | Self::Topic { deployment, .. } => deployment,
        }
    }

    /// Returns the service handle, if this is a service.
    #[must_use]
    pub const fn as_service(&self) -> Option<&ServiceHandle> {
        match self {
            Self::Service(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the queue handle, if this is a queue.
    #[must_use]
    pub const fn as_queue(&self) -> Option<&QueueHandle> {
        match self {
            Self::Queue { queue, .. } => Some(queue),
            _ => None,
        }
    }

    /// Returns the topic handle, if this is a topic.
    #[must_use]
    pub const fn as_topic(&self) -> Option<&TopicHandle> {
        match self {
            Self::Topic { topic, .. } => Some(topic),
            _ => None,
        }
    }
}

/// Handle to a started service and the environment injected into it.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    pub(crate) name: ResourceName,
    pub(crate) deployment: DeploymentId,
    pub(crate) env: Arc<BTreeMap<String, String>>,
    pub(crate) params: Arc<BTreeMap<String, String>>,
}

impl ServiceHandle {
    /// Service name.
    #[must_use]
    pub const fn name(&self) -> &ResourceName {
        &self.name
    }

    /// Looks up an injected environment variable.
    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// All injected environment variables.
    #[must_use]
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Application environment the service runs in, e.g. `development`.
    #[must_use]
    pub fn application_env(&self) -> Option<&str> {
        self.env_var(APP_ENV_VAR)
    }

    /// Looks up a service parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}
