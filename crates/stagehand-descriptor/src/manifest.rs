//! Resource declarations shipped inside an application root.
//!
//! An application lists the services, queues and topics it provides in a
//! YAML manifest (by default `config/stagehand.yml`):
//!
//! ```yaml
//! services:
//!   SimpleService:
//!     requires: ["/queue/container_queue"]
//!     requires_env: [BASEDIR]
//!     params: { greeting: hello }
//! queues:
//!   /queue/container_queue:
//!     durable: true
//! topics:
//!   /topic/announcements: {}
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use stagehand_common::error::{Result, StagehandError};
use stagehand_common::types::{ResourceKind, ResourceName};

use crate::graph::DependencyGraph;
use crate::parser::validator::is_env_var_name;
use crate::parser::parse_err;

/// A service declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Lookup name of the service.
    pub name: ResourceName,
    /// Resources that must be started before this service.
    pub requires: Vec<ResourceName>,
    /// Environment variables that must be injected for the service to start.
    pub requires_env: Vec<String>,
    /// Service-specific parameters.
    pub params: BTreeMap<String, String>,
}

/// A queue or topic declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSpec {
    /// Lookup name of the destination.
    pub name: ResourceName,
    /// Whether messages survive a restart of the destination.
    pub durable: bool,
}

/// Every resource an application declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppManifest {
    /// Declared services.
    pub services: Vec<ServiceSpec>,
    /// Declared queues.
    pub queues: Vec<DestinationSpec>,
    /// Declared topics.
    pub topics: Vec<DestinationSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    services: BTreeMap<String, Option<RawService>>,
    #[serde(default)]
    queues: BTreeMap<String, Option<RawDestination>>,
    #[serde(default)]
    topics: BTreeMap<String, Option<RawDestination>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawService {
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    requires_env: Vec<String>,
    #[serde(default)]
    params: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDestination {
    #[serde(default = "default_durable")]
    durable: bool,
}

impl Default for RawDestination {
    fn default() -> Self {
        Self {
            durable: default_durable(),
        }
    }
}

const fn default_durable() -> bool {
    true
}

impl AppManifest {
    /// Returns every declared resource name.
    pub fn resource_names(&self) -> impl Iterator<Item = &ResourceName> {
        self.services
            .iter()
            .map(|s| &s.name)
            .chain(self.queues.iter().map(|q| &q.name))
            .chain(self.topics.iter().map(|t| &t.name))
    }

    /// Returns the number of declared resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len() + self.queues.len() + self.topics.len()
    }

    /// Returns whether nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a service declaration.
    #[must_use]
    pub fn service(&self, name: &ResourceName) -> Option<&ServiceSpec> {
        self.services.iter().find(|s| &s.name == name)
    }

    /// Looks up a queue or topic declaration.
    #[must_use]
    pub fn destination(&self, name: &ResourceName) -> Option<&DestinationSpec> {
        self.queues
            .iter()
            .chain(self.topics.iter())
            .find(|d| &d.name == name)
    }

    /// Returns the order resources must start in.
    ///
    /// Destinations with no dependents come first; every service follows
    /// the resources it requires.
    ///
    /// # Errors
    ///
    /// Returns an error if the `requires` declarations form a cycle.
    pub fn start_order(&self) -> Result<Vec<ResourceName>> {
        let mut graph = DependencyGraph::new();
        for name in self.resource_names() {
            let _ = graph.add_resource(name.clone());
        }
        for service in &self.services {
            let dependent = graph.add_resource(service.name.clone());
            for required in &service.requires {
                let dependency = graph.add_resource(required.clone());
                graph.add_dependency(dependent, dependency);
            }
        }
        let order = graph.resolve_order()?;
        tracing::debug!(?order, "resource start order resolved");
        Ok(order)
    }
}

/// Parses manifest text.
///
/// # Errors
///
/// Returns an error if the YAML is invalid, a name does not belong to its
/// section, a service is declared twice, a `requires` entry names an
/// undeclared resource, or the dependencies are cyclic.
pub fn parse_manifest(input: &str) -> Result<AppManifest> {
    if input.trim().is_empty() {
        return Ok(AppManifest::default());
    }
    let raw: Option<RawManifest> =
        serde_yaml::from_str(input).map_err(|e| parse_err(format!("invalid manifest: {e}")))?;
    let raw = raw.unwrap_or_default();

    let mut manifest = AppManifest::default();
    for (key, decl) in raw.queues {
        let name = section_name(&key, ResourceKind::Queue)?;
        manifest.queues.push(DestinationSpec {
            name,
            durable: decl.unwrap_or_default().durable,
        });
    }
    for (key, decl) in raw.topics {
        let name = section_name(&key, ResourceKind::Topic)?;
        manifest.topics.push(DestinationSpec {
            name,
            durable: decl.unwrap_or_default().durable,
        });
    }
    let mut seen = HashSet::new();
    for (key, decl) in raw.services {
        let service = service_spec(&key, decl.unwrap_or_default())?;
        if !seen.insert(service.name.clone()) {
            return Err(parse_err(format!("service {} declared twice", service.name)));
        }
        manifest.services.push(service);
    }

    check_requirements(&manifest)?;
    let _ = manifest.start_order()?;
    Ok(manifest)
}

/// Loads the manifest of an application root.
///
/// A missing manifest file yields an empty manifest: the application
/// deploys but declares no resources.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_manifest(root: &Path, manifest_path: &Path) -> Result<AppManifest> {
    let path = root.join(manifest_path);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no manifest, application declares no resources");
        return Ok(AppManifest::default());
    }
    tracing::debug!(path = %path.display(), "loading application manifest");
    let content = std::fs::read_to_string(&path).map_err(|e| StagehandError::Io {
        path: path.clone(),
        source: e,
    })?;
    parse_manifest(&content)
}

fn section_name(key: &str, kind: ResourceKind) -> Result<ResourceName> {
    let name: ResourceName = key.parse()?;
    if name.kind() != kind {
        return Err(parse_err(format!("\"{key}\" is not a {kind} name")));
    }
    Ok(name)
}

fn service_spec(key: &str, raw: RawService) -> Result<ServiceSpec> {
    let name = if key.starts_with(stagehand_common::constants::SERVICE_PREFIX) {
        section_name(key, ResourceKind::Service)?
    } else {
        ResourceName::service(key)?
    };

    let requires = raw
        .requires
        .iter()
        .map(|r| r.parse::<ResourceName>())
        .collect::<Result<Vec<_>>>()?;

    for var in &raw.requires_env {
        if !is_env_var_name(var) {
            return Err(parse_err(format!(
                "service {name}: invalid required environment variable \"{var}\""
            )));
        }
    }

    let params = raw
        .params
        .into_iter()
        .map(|(k, v)| (k, v.unwrap_or_default()))
        .collect();

    Ok(ServiceSpec {
        name,
        requires,
        requires_env: raw.requires_env,
        params,
    })
}

fn check_requirements(manifest: &AppManifest) -> Result<()> {
    let declared: HashSet<&ResourceName> = manifest.resource_names().collect();
    for service in &manifest.services {
        for required in &service.requires {
            if !declared.contains(required) {
                return Err(parse_err(format!(
                    "service {} requires undeclared resource {required}",
                    service.name
                )));
            }
        }
    }
    Ok(())
}
