//! Deployment driver that feeds descriptors to an environment.

use std::path::{Path, PathBuf};

use stagehand_common::config::StagehandConfig;
use stagehand_common::types::{DeploymentId, ResourceName};
use stagehand_descriptor::descriptor::DeploymentDescriptor;
use stagehand_descriptor::parser::{self, validator};

use crate::environment::local::LocalEnvironment;
use crate::environment::{DeploymentReceipt, DeploymentSummary, Environment, resolve_runtime};
use crate::error::{DeploymentError, Result};
use crate::handle::ResourceHandle;

/// What deploying a descriptor would start, computed without starting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    /// Deployment name.
    pub name: String,
    /// Application root.
    pub application_root: PathBuf,
    /// Runtime the application would run on.
    pub runtime: String,
    /// Resources in start order.
    pub order: Vec<ResourceName>,
}

/// The deployment driver.
///
/// Validates descriptors, hands them to the environment, and resolves
/// resources afterwards. Works with any [`Environment`].
pub struct Deployer {
    environment: Box<dyn Environment>,
    config: StagehandConfig,
}

impl Deployer {
    /// Creates a driver for the given environment.
    #[must_use]
    pub fn new(environment: Box<dyn Environment>, config: StagehandConfig) -> Self {
        Self {
            environment,
            config,
        }
    }

    /// Creates a driver backed by a fresh in-process environment.
    #[must_use]
    pub fn local(config: StagehandConfig) -> Self {
        Self::new(Box::new(LocalEnvironment::new(config.clone())), config)
    }

    /// Deploys a descriptor, blocking until it is deployed or has failed.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the environment rejects the
    /// deployment.
    pub fn deploy(&self, descriptor: &DeploymentDescriptor) -> Result<DeploymentReceipt> {
        validator::validate(descriptor)?;
        let receipt = self.environment.deploy(descriptor)?;
        tracing::info!(
            id = %receipt.id(),
            name = %receipt.summary.name,
            outcome = ?receipt.outcome,
            "deployment finished"
        );
        Ok(receipt)
    }

    /// Parses descriptor text and deploys it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or deployment fails.
    pub fn deploy_str(&self, text: &str, base_dir: Option<&Path>) -> Result<DeploymentReceipt> {
        let descriptor = parser::parse_descriptor(text, base_dir)?;
        self.deploy(&descriptor)
    }

    /// Reads a descriptor file and deploys it; relative application roots
    /// resolve against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or
    /// deployment fails.
    pub fn deploy_file(&self, path: &Path) -> Result<DeploymentReceipt> {
        let descriptor = parser::parse_descriptor_file(path)?;
        self.deploy(&descriptor)
    }

    /// Computes what a descriptor would start without deploying it.
    ///
    /// # Errors
    ///
    /// Returns an error for the same static reasons `deploy` would: a
    /// malformed descriptor or manifest, an unreachable root, or an
    /// unsupported runtime.
    pub fn plan(&self, descriptor: &DeploymentDescriptor) -> Result<DeploymentPlan> {
        validator::validate(descriptor)?;
        let info = self.environment.info();
        let runtime = resolve_runtime(
            descriptor.runtime_version(),
            &info.supported_runtimes,
            &info.default_runtime,
        )?;
        let root = descriptor.application_root();
        if !root.is_dir() {
            return Err(DeploymentError::UnreachableRoot {
                path: root.to_path_buf(),
                reason: "not an existing directory".into(),
            });
        }
        let manifest =
            stagehand_descriptor::manifest::load_manifest(root, &self.config.manifest_path)?;
        Ok(DeploymentPlan {
            name: descriptor.name(),
            application_root: root.to_path_buf(),
            runtime,
            order: manifest.start_order()?,
        })
    }

    /// Stops and removes a deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if no deployment has this id.
    pub fn undeploy(&self, id: &DeploymentId) -> Result<()> {
        self.environment.undeploy(id)
    }

    /// Resolves a resource; `None` means it is not deployed.
    #[must_use]
    pub fn fetch(&self, name: &ResourceName) -> Option<ResourceHandle> {
        self.environment.fetch(name)
    }

    /// Parses a symbolic name and resolves it.
    ///
    /// # Errors
    ///
    /// Returns an error only if the name is malformed; a missing resource
    /// is `Ok(None)`.
    pub fn fetch_str(&self, name: &str) -> stagehand_common::error::Result<Option<ResourceHandle>> {
        let name: ResourceName = name.parse()?;
        Ok(self.fetch(&name))
    }

    /// Lists current deployments.
    #[must_use]
    pub fn deployments(&self) -> Vec<DeploymentSummary> {
        self.environment.deployments()
    }

    /// Returns the environment this driver deploys to.
    #[must_use]
    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    /// Returns the driver configuration.
    #[must_use]
    pub const fn config(&self) -> &StagehandConfig {
        &self.config
    }
}

impl Default for Deployer {
    fn default() -> Self {
        Self::local(StagehandConfig::default())
    }
}
