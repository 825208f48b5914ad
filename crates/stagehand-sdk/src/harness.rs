//! Deploy-then-assert harness for integration tests.
//!
//! A [`Harness`] deploys descriptors, resolves the resources they declare,
//! and undeploys everything it deployed when torn down or dropped.

use std::path::Path;

use stagehand_common::config::StagehandConfig;
use stagehand_common::error::StagehandError;
use stagehand_common::types::{DeploymentId, ResourceName};
use stagehand_descriptor::descriptor::DeploymentDescriptor;
use stagehand_runtime::engine::Deployer;
use stagehand_runtime::environment::{DeployOutcome, DeploymentReceipt, Environment};
use stagehand_runtime::error::DeploymentError;
use stagehand_runtime::handle::ResourceHandle;
use thiserror::Error;

/// Errors reported by the harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Deployment or undeployment failed.
    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    /// A resource name did not parse.
    #[error(transparent)]
    InvalidName(#[from] StagehandError),

    /// An expected resource is not deployed.
    #[error("expected resource {name} to be deployed, but it is absent")]
    Missing {
        /// The resource that did not resolve.
        name: ResourceName,
    },
}

/// Result alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Drives deployments for a test and cleans up after it.
pub struct Harness {
    deployer: Deployer,
    deployed: Vec<DeploymentId>,
}

impl Harness {
    /// Creates a harness over the given environment.
    #[must_use]
    pub fn new(environment: Box<dyn Environment>, config: StagehandConfig) -> Self {
        Self {
            deployer: Deployer::new(environment, config),
            deployed: Vec::new(),
        }
    }

    /// Creates a harness over a fresh in-process environment.
    #[must_use]
    pub fn local() -> Self {
        Self::from_deployer(Deployer::default())
    }

    /// Wraps an existing driver.
    #[must_use]
    pub fn from_deployer(deployer: Deployer) -> Self {
        Self {
            deployer,
            deployed: Vec::new(),
        }
    }

    /// Deploys a descriptor and tracks it for teardown.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployment fails.
    pub fn deploy(&mut self, descriptor: &DeploymentDescriptor) -> Result<DeploymentReceipt> {
        let receipt = self.deployer.deploy(descriptor)?;
        self.track(&receipt);
        Ok(receipt)
    }

    /// Reads a descriptor file and deploys it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the deployment fails.
    pub fn deploy_file(&mut self, path: &Path) -> Result<DeploymentReceipt> {
        let receipt = self.deployer.deploy_file(path)?;
        self.track(&receipt);
        Ok(receipt)
    }

    /// Parses descriptor text and deploys it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or the deployment fails.
    pub fn deploy_str(
        &mut self,
        text: &str,
        base_dir: Option<&Path>,
    ) -> Result<DeploymentReceipt> {
        let receipt = self.deployer.deploy_str(text, base_dir)?;
        self.track(&receipt);
        Ok(receipt)
    }

    /// Resolves a resource; `None` means it is not deployed.
    #[must_use]
    pub fn fetch(&self, name: &ResourceName) -> Option<ResourceHandle> {
        self.deployer.fetch(name)
    }

    /// Parses a symbolic name and resolves it.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is malformed.
    pub fn fetch_str(&self, name: &str) -> Result<Option<ResourceHandle>> {
        Ok(self.deployer.fetch_str(name)?)
    }

    /// Resolves a resource that the test expects to be deployed.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is malformed or the resource is absent.
    pub fn expect(&self, name: &str) -> Result<ResourceHandle> {
        let name: ResourceName = name.parse()?;
        self.fetch(&name).ok_or(HarnessError::Missing { name })
    }

    /// Ids of the deployments this harness still owns.
    #[must_use]
    pub fn deployed(&self) -> &[DeploymentId] {
        &self.deployed
    }

    /// The underlying driver.
    #[must_use]
    pub const fn deployer(&self) -> &Deployer {
        &self.deployer
    }

    /// Undeploys everything this harness deployed, newest first.
    ///
    /// Keeps going after a failure and reports the first one.
    ///
    /// # Errors
    ///
    /// Returns the first undeploy error encountered.
    pub fn teardown(&mut self) -> Result<()> {
        let mut first_err = None;
        while let Some(id) = self.deployed.pop() {
            if let Err(e) = self.deployer.undeploy(&id) {
                tracing::warn!(id = %id, error = %e, "teardown failed to undeploy");
                let _ = first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), |e| Err(e.into()))
    }

    fn track(&mut self, receipt: &DeploymentReceipt) {
        match &receipt.outcome {
            DeployOutcome::Created => self.deployed.push(receipt.id().clone()),
            DeployOutcome::Replaced { previous } => {
                self.deployed.retain(|id| id != previous);
                self.deployed.push(receipt.id().clone());
            }
            DeployOutcome::Unchanged => {
                if !self.deployed.contains(receipt.id()) {
                    self.deployed.push(receipt.id().clone());
                }
            }
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::local()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if !self.deployed.is_empty() {
            tracing::debug!(deployments = self.deployed.len(), "harness dropped, undeploying");
            let _ = self.teardown();
        }
    }
}
