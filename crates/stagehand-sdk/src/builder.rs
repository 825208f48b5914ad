//! Fluent API for assembling deployment descriptors in test code.

use std::collections::BTreeMap;
use std::path::PathBuf;

use stagehand_common::error::Result;
use stagehand_descriptor::descriptor::DeploymentDescriptor;
use stagehand_descriptor::parser::validator;

/// Builder for a [`DeploymentDescriptor`].
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    root: PathBuf,
    environment: BTreeMap<String, String>,
    runtime_version: Option<String>,
    application_env: Option<String>,
    name: Option<String>,
}

impl DescriptorBuilder {
    /// Starts a descriptor for the application at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            environment: BTreeMap::new(),
            runtime_version: None,
            application_env: None,
            name: None,
        }
    }

    /// Adds an environment variable injected into every service.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.environment.insert(key.into(), value.into());
        self
    }

    /// Pins the runtime version, e.g. `"1.9"`.
    #[must_use]
    pub fn runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = Some(version.into());
        self
    }

    /// Sets the application environment name, e.g. `"development"`.
    #[must_use]
    pub fn application_env(mut self, env: impl Into<String>) -> Self {
        self.application_env = Some(env.into());
        self
    }

    /// Sets the deployment name instead of deriving it from the root.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds and validates the descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable name, the version, the application
    /// environment or the name is malformed.
    pub fn build(self) -> Result<DeploymentDescriptor> {
        let mut descriptor =
            DeploymentDescriptor::new(self.root, self.environment, self.runtime_version);
        if let Some(env) = self.application_env {
            descriptor = descriptor.with_application_env(env);
        }
        if let Some(name) = self.name {
            descriptor = descriptor.with_name(name);
        }
        validator::validate(&descriptor)?;
        Ok(descriptor)
    }
}
