//! Domain primitive types used across the Stagehand workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{QUEUE_PREFIX, SERVICE_PREFIX, TOPIC_PREFIX};
use crate::error::StagehandError;

/// Unique identifier for a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeploymentId(String);

impl DeploymentId {
    /// Creates a new deployment ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random deployment ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of a resolvable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A named service.
    Service,
    /// A point-to-point messaging destination.
    Queue,
    /// A publish/subscribe messaging destination.
    Topic,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Queue => write!(f, "queue"),
            Self::Topic => write!(f, "topic"),
        }
    }
}

/// Symbolic name of a resource in the lookup namespace.
///
/// The string forms are `service:<Name>`, `/queue/<path>` and
/// `/topic/<path>`. Destination variants hold the path without its prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceName {
    /// `service:<Name>`
    Service(String),
    /// `/queue/<path>`
    Queue(String),
    /// `/topic/<path>`
    Topic(String),
}

impl ResourceName {
    /// Builds a validated service name.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or contains whitespace.
    pub fn service(name: impl Into<String>) -> crate::error::Result<Self> {
        let name = name.into();
        check_service_name(&name, &name)?;
        Ok(Self::Service(name))
    }

    /// Builds a validated queue name from a path such as `orders/incoming`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path has empty segments or whitespace.
    pub fn queue(path: impl Into<String>) -> crate::error::Result<Self> {
        let path = path.into();
        check_destination_path(&path, &path)?;
        Ok(Self::Queue(path))
    }

    /// Builds a validated topic name from a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path has empty segments or whitespace.
    pub fn topic(path: impl Into<String>) -> crate::error::Result<Self> {
        let path = path.into();
        check_destination_path(&path, &path)?;
        Ok(Self::Topic(path))
    }

    /// Returns the resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Service(_) => ResourceKind::Service,
            Self::Queue(_) => ResourceKind::Queue,
            Self::Topic(_) => ResourceKind::Topic,
        }
    }

    /// Returns the bare name or path, without the namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        match self {
            Self::Service(s) | Self::Queue(s) | Self::Topic(s) => s,
        }
    }
}

fn check_service_name(input: &str, name: &str) -> crate::error::Result<()> {
    if name.is_empty() {
        return Err(invalid(input, "service name is empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid(input, "service name contains whitespace"));
    }
    Ok(())
}

fn check_destination_path(input: &str, path: &str) -> crate::error::Result<()> {
    if path.is_empty() {
        return Err(invalid(input, "destination path is empty"));
    }
    if path.split('/').any(str::is_empty) {
        return Err(invalid(input, "destination path has an empty segment"));
    }
    if path.chars().any(char::is_whitespace) {
        return Err(invalid(input, "destination path contains whitespace"));
    }
    Ok(())
}

fn invalid(input: &str, reason: &'static str) -> StagehandError {
    StagehandError::InvalidResourceName {
        name: input.to_string(),
        reason,
    }
}

impl FromStr for ResourceName {
    type Err = StagehandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix(SERVICE_PREFIX) {
            check_service_name(s, name)?;
            Ok(Self::Service(name.to_string()))
        } else if let Some(path) = s.strip_prefix(QUEUE_PREFIX) {
            check_destination_path(s, path)?;
            Ok(Self::Queue(path.to_string()))
        } else if let Some(path) = s.strip_prefix(TOPIC_PREFIX) {
            check_destination_path(s, path)?;
            Ok(Self::Topic(path.to_string()))
        } else {
            Err(invalid(
                s,
                "expected service:<name>, /queue/<path> or /topic/<path>",
            ))
        }
    }
}

impl TryFrom<String> for ResourceName {
    type Error = StagehandError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceName> for String {
    fn from(value: ResourceName) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(name) => write!(f, "{SERVICE_PREFIX}{name}"),
            Self::Queue(path) => write!(f, "{QUEUE_PREFIX}{path}"),
            Self::Topic(path) => write!(f, "{TOPIC_PREFIX}{path}"),
        }
    }
}

/// Lifecycle state of a deployed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    /// Declared but not started, or torn down.
    Stopped,
    /// Started and resolvable.
    Started,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Started => write!(f, "started"),
        }
    }
}
