//! Runtime injection of the deployment environment into services.
//!
//! Every service receives the descriptor's environment variables plus the
//! application root and application environment name.

use std::collections::BTreeMap;

use stagehand_common::types::ResourceName;

use crate::descriptor::DeploymentDescriptor;
use crate::manifest::AppManifest;

/// Variable carrying the application root directory.
pub const APP_ROOT_VAR: &str = "APP_ROOT";

/// Variable carrying the application environment name.
pub const APP_ENV_VAR: &str = "APP_ENV";

/// A service with its injected environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    /// Service name.
    pub name: ResourceName,
    /// Injected environment variables.
    pub env: BTreeMap<String, String>,
    /// Service-specific parameters from the manifest.
    pub params: BTreeMap<String, String>,
    /// Required variables absent from `env`.
    pub missing_env: Vec<String>,
}

impl ResolvedService {
    /// Returns whether every required variable is present.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.missing_env.is_empty()
    }
}

/// Builds the environment injected into every service of `manifest`.
///
/// Variables declared in the descriptor take precedence over the
/// generated `APP_ROOT` and `APP_ENV` entries.
#[must_use]
pub fn resolve_services(
    descriptor: &DeploymentDescriptor,
    manifest: &AppManifest,
) -> Vec<ResolvedService> {
    let base_env = injected_environment(descriptor);
    manifest
        .services
        .iter()
        .map(|spec| {
            let missing_env = spec
                .requires_env
                .iter()
                .filter(|var| !base_env.contains_key(var.as_str()))
                .cloned()
                .collect();
            ResolvedService {
                name: spec.name.clone(),
                env: base_env.clone(),
                params: spec.params.clone(),
                missing_env,
            }
        })
        .collect()
}

fn injected_environment(descriptor: &DeploymentDescriptor) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    let _ = env.insert(
        APP_ROOT_VAR.to_string(),
        descriptor.application_root().display().to_string(),
    );
    if let Some(app_env) = descriptor.application_env() {
        let _ = env.insert(APP_ENV_VAR.to_string(), app_env.to_string());
    }
    for (k, v) in descriptor.environment() {
        let _ = env.insert(k.clone(), v.clone());
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_manifest;

    fn descriptor(env: &[(&str, &str)]) -> DeploymentDescriptor {
        let env = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DeploymentDescriptor::new("/srv/app", env, None).with_application_env("development")
    }

    #[test]
    fn resolve_empty_manifest() {
        assert!(resolve_services(&descriptor(&[]), &AppManifest::default()).is_empty());
    }

    #[test]
    fn resolve_injects_descriptor_environment() {
        let manifest = parse_manifest("services:\n  Svc: {}\n").expect("manifest");
        let resolved = resolve_services(&descriptor(&[("BASEDIR", "/srv")]), &manifest);
        let svc = &resolved[0];
        assert_eq!(svc.env.get("BASEDIR").map(String::as_str), Some("/srv"));
        assert_eq!(svc.env.get(APP_ROOT_VAR).map(String::as_str), Some("/srv/app"));
        assert_eq!(svc.env.get(APP_ENV_VAR).map(String::as_str), Some("development"));
        assert!(svc.is_satisfied());
    }

    #[test]
    fn resolve_descriptor_overrides_generated_vars() {
        let manifest = parse_manifest("services:\n  Svc: {}\n").expect("manifest");
        let resolved = resolve_services(&descriptor(&[("APP_ENV", "staging")]), &manifest);
        assert_eq!(resolved[0].env.get(APP_ENV_VAR).map(String::as_str), Some("staging"));
    }

    #[test]
    fn resolve_reports_missing_required_env() {
        let manifest =
            parse_manifest("services:\n  Svc:\n    requires_env: [BASEDIR, APP_ROOT]\n").expect("manifest");
        let resolved = resolve_services(&descriptor(&[]), &manifest);
        assert_eq!(resolved[0].missing_env, vec!["BASEDIR"]);
        assert!(!resolved[0].is_satisfied());
    }
}
