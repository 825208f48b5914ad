//! In-process deployment environment.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use stagehand_common::config::StagehandConfig;
use stagehand_common::types::{DeploymentId, ResourceName};
use stagehand_descriptor::descriptor::DeploymentDescriptor;
use stagehand_descriptor::manifest::{self, AppManifest};
use stagehand_descriptor::parser::validator;
use stagehand_descriptor::resolver;

use super::{
    DeployOutcome, DeploymentReceipt, DeploymentSummary, Environment, EnvironmentInfo,
    resolve_runtime,
};
use crate::error::{DeploymentError, Result};
use crate::handle::ResourceHandle;
use crate::resource::{Resource, Service};

/// Name reported by [`LocalEnvironment::info`].
const ENVIRONMENT_NAME: &str = "local";

/// A deployment and the resources it started, in start order.
#[derive(Debug)]
struct Deployment {
    summary: DeploymentSummary,
    resources: Vec<Resource>,
}

impl Deployment {
    fn resource(&self, name: &ResourceName) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name() == name)
    }

    fn stop_all(&mut self) {
        stop_in_reverse(&mut self.resources);
    }
}

#[derive(Debug, Default)]
struct Registry {
    deployments: BTreeMap<DeploymentId, Deployment>,
    by_name: HashMap<String, DeploymentId>,
    owners: HashMap<ResourceName, DeploymentId>,
}

impl Registry {
    fn insert(&mut self, deployment: Deployment) {
        let id = deployment.summary.id.clone();
        for resource in &deployment.resources {
            let _ = self.owners.insert(resource.name().clone(), id.clone());
        }
        let _ = self
            .by_name
            .insert(deployment.summary.name.clone(), id.clone());
        let _ = self.deployments.insert(id, deployment);
    }

    fn remove(&mut self, id: &DeploymentId) -> Option<Deployment> {
        let deployment = self.deployments.remove(id)?;
        self.owners.retain(|_, owner| owner != id);
        if self.by_name.get(&deployment.summary.name) == Some(id) {
            let _ = self.by_name.remove(&deployment.summary.name);
        }
        Some(deployment)
    }

    fn owner_name(&self, id: &DeploymentId) -> String {
        self.deployments
            .get(id)
            .map_or_else(|| id.to_string(), |d| d.summary.name.clone())
    }
}

/// Environment hosting deployments inside the current process.
///
/// Deployments are all-or-nothing: resources start in dependency order and
/// a failure stops everything already started before returning. When a
/// state file is configured, every deploy and undeploy is recorded there.
#[derive(Debug)]
pub struct LocalEnvironment {
    config: StagehandConfig,
    state_file: Option<PathBuf>,
    registry: RwLock<Registry>,
}

impl LocalEnvironment {
    /// Creates an empty environment that keeps no state on disk.
    #[must_use]
    pub fn new(config: StagehandConfig) -> Self {
        Self {
            config,
            state_file: None,
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Records deployments in the configured state file.
    #[must_use]
    pub fn persistent(config: StagehandConfig) -> Self {
        let state_file = config.state_file.clone();
        Self::new(config).with_state_file(state_file)
    }

    /// Records deployments in the given state file.
    #[must_use]
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// Returns the environment configuration.
    #[must_use]
    pub const fn config(&self) -> &StagehandConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, summary: &DeploymentSummary) {
        if let Some(path) = &self.state_file {
            if let Err(e) = crate::state::record(path, summary) {
                tracing::warn!(path = %path.display(), error = %e, "failed to record deployment");
            }
        }
    }

    fn forget(&self, name: &str) {
        if let Some(path) = &self.state_file {
            if let Err(e) = crate::state::forget(path, name) {
                tracing::warn!(path = %path.display(), error = %e, "failed to forget deployment");
            }
        }
    }
}

impl Default for LocalEnvironment {
    fn default() -> Self {
        Self::new(StagehandConfig::default())
    }
}

impl Environment for LocalEnvironment {
    fn info(&self) -> EnvironmentInfo {
        EnvironmentInfo {
            name: ENVIRONMENT_NAME.to_string(),
            supported_runtimes: self.config.supported_runtimes.clone(),
            default_runtime: self.config.default_runtime.clone(),
        }
    }

    fn deploy(&self, descriptor: &DeploymentDescriptor) -> Result<DeploymentReceipt> {
        validator::validate(descriptor)?;
        let runtime = resolve_runtime(
            descriptor.runtime_version(),
            &self.config.supported_runtimes,
            &self.config.default_runtime,
        )?;
        let root = descriptor.application_root();
        check_root(root)?;

        let name = descriptor.name();
        let digest = descriptor.digest()?;

        let mut registry = self.write();
        let previous = registry.by_name.get(&name).cloned();
        if let Some(existing) = previous.as_ref().and_then(|id| registry.deployments.get(id)) {
            if existing.summary.digest == digest {
                tracing::info!(id = %existing.summary.id, name = %name, "descriptor unchanged, skipping deployment");
                return Ok(DeploymentReceipt {
                    summary: existing.summary.clone(),
                    outcome: DeployOutcome::Unchanged,
                });
            }
        }

        let manifest = manifest::load_manifest(root, &self.config.manifest_path)?;
        let order = manifest.start_order()?;
        for resource in &order {
            if let Some(owner) = registry.owners.get(resource) {
                if Some(owner) != previous.as_ref() {
                    return Err(DeploymentError::ResourceConflict {
                        name: resource.clone(),
                        owner: registry.owner_name(owner),
                    });
                }
            }
        }

        let id = DeploymentId::generate();
        tracing::info!(id = %id, name = %name, root = %root.display(), %runtime, "deploying application");
        let resources = start_resources(descriptor, &manifest, &order)?;

        let summary = DeploymentSummary {
            id: id.clone(),
            name: name.clone(),
            digest,
            application_root: root.to_path_buf(),
            runtime,
            resources: resources.iter().map(|r| r.name().clone()).collect(),
            deployed_at: chrono::Utc::now().to_rfc3339(),
        };

        let outcome = match previous.and_then(|prev| registry.remove(&prev)) {
            Some(mut old) => {
                hand_over_durable(&old, &resources);
                old.stop_all();
                tracing::info!(id = %id, previous = %old.summary.id, name = %name, "deployment replaced");
                DeployOutcome::Replaced {
                    previous: old.summary.id,
                }
            }
            None => DeployOutcome::Created,
        };

        registry.insert(Deployment {
            summary: summary.clone(),
            resources,
        });
        drop(registry);

        tracing::info!(id = %id, name = %name, resources = summary.resources.len(), "application deployed");
        self.record(&summary);
        Ok(DeploymentReceipt { summary, outcome })
    }

    fn undeploy(&self, id: &DeploymentId) -> Result<()> {
        let mut registry = self.write();
        let mut deployment = registry
            .remove(id)
            .ok_or_else(|| DeploymentError::NotDeployed { id: id.clone() })?;
        drop(registry);

        deployment.stop_all();
        tracing::info!(id = %id, name = %deployment.summary.name, "application undeployed");
        self.forget(&deployment.summary.name);
        Ok(())
    }

    fn fetch(&self, name: &ResourceName) -> Option<ResourceHandle> {
        let registry = self.read();
        let owner = registry.owners.get(name)?;
        let handle = registry
            .deployments
            .get(owner)
            .and_then(|d| d.resource(name))
            .and_then(|r| r.handle(owner));
        tracing::debug!(resource = %name, found = handle.is_some(), "resource lookup");
        handle
    }

    fn deployments(&self) -> Vec<DeploymentSummary> {
        self.read()
            .deployments
            .values()
            .map(|d| d.summary.clone())
            .collect()
    }
}

/// Checks that the application root is an existing, listable directory.
fn check_root(root: &Path) -> Result<()> {
    let unreachable = |reason: String| DeploymentError::UnreachableRoot {
        path: root.to_path_buf(),
        reason,
    };
    let metadata = std::fs::metadata(root).map_err(|e| unreachable(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(unreachable("not a directory".into()));
    }
    let _ = std::fs::read_dir(root).map_err(|e| unreachable(e.to_string()))?;
    Ok(())
}

/// Starts every declared resource in `order`, stopping the ones already
/// started if any fails.
fn start_resources(
    descriptor: &DeploymentDescriptor,
    manifest: &AppManifest,
    order: &[ResourceName],
) -> Result<Vec<Resource>> {
    let mut services: HashMap<ResourceName, _> = resolver::resolve_services(descriptor, manifest)
        .into_iter()
        .map(|s| (s.name.clone(), s))
        .collect();

    let mut started: Vec<Resource> = Vec::with_capacity(order.len());
    for name in order {
        let mut resource = if let Some(resolved) = services.remove(name) {
            Resource::Service(Service::new(resolved))
        } else if let Some(spec) = manifest.destination(name) {
            Resource::destination(spec)
        } else {
            continue;
        };

        if let Err(err) = resource.start() {
            tracing::warn!(resource = %name, error = %err, started = started.len(), "start failed, rolling back");
            stop_in_reverse(&mut started);
            return Err(err);
        }
        started.push(resource);
    }
    Ok(started)
}

fn stop_in_reverse(resources: &mut [Resource]) {
    for resource in resources.iter_mut().rev() {
        resource.stop();
    }
}

/// Moves messages between same-named destinations of the old deployment
/// and its successor. Both sides must be durable.
fn hand_over_durable(old: &Deployment, successor: &[Resource]) {
    for resource in successor {
        let Resource::Destination(next) = resource else {
            continue;
        };
        if !next.is_durable() {
            continue;
        }
        match old.resource(next.name()) {
            Some(Resource::Destination(prev)) if prev.is_durable() => prev.hand_over(next),
            _ => {}
        }
    }
}
