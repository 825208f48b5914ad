//! The deployment descriptor model.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use stagehand_common::error::Result;

/// Name used when neither the descriptor nor the root path yields one.
const FALLBACK_NAME: &str = "application";

/// Everything needed to deploy one application.
///
/// Fields are private; a descriptor cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentDescriptor {
    application_root: PathBuf,
    application_env: Option<String>,
    name: Option<String>,
    environment: BTreeMap<String, String>,
    runtime_version: Option<String>,
}

impl DeploymentDescriptor {
    /// Creates a descriptor for the given application root.
    #[must_use]
    pub fn new(
        application_root: impl Into<PathBuf>,
        environment: BTreeMap<String, String>,
        runtime_version: Option<String>,
    ) -> Self {
        Self {
            application_root: application_root.into(),
            application_env: None,
            name: None,
            environment,
            runtime_version,
        }
    }

    /// Returns a copy carrying the given application environment name.
    #[must_use]
    pub fn with_application_env(mut self, env: impl Into<String>) -> Self {
        self.application_env = Some(env.into());
        self
    }

    /// Returns a copy carrying an explicit deployment name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Application root directory.
    #[must_use]
    pub fn application_root(&self) -> &Path {
        &self.application_root
    }

    /// Application environment name (`development`, `test`, ...).
    #[must_use]
    pub fn application_env(&self) -> Option<&str> {
        self.application_env.as_deref()
    }

    /// Environment variables injected into the deployed application.
    #[must_use]
    pub const fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Requested runtime version, if any.
    #[must_use]
    pub fn runtime_version(&self) -> Option<&str> {
        self.runtime_version.as_deref()
    }

    /// The explicitly configured name, if any.
    #[must_use]
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Deployment name: the explicit name, else the root directory's name.
    #[must_use]
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.application_root
                .file_name()
                .map_or_else(|| FALLBACK_NAME.to_string(), |n| n.to_string_lossy().into_owned())
        })
    }

    /// Hex-encoded SHA-256 of the descriptor's canonical JSON form.
    ///
    /// Two descriptors with equal contents always share a digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be serialized.
    pub fn digest(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self)?;
        let hash = Sha256::digest(&canonical);
        Ok(hash.iter().map(|b| format!("{b:02x}")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeploymentDescriptor {
        let mut env = BTreeMap::new();
        let _ = env.insert("BASEDIR".to_string(), "/srv".to_string());
        DeploymentDescriptor::new("/srv/apps/alacarte/services", env, Some("1.9".into()))
    }

    #[test]
    fn name_defaults_to_root_directory_name() {
        assert_eq!(sample().name(), "services");
    }

    #[test]
    fn explicit_name_wins() {
        assert_eq!(sample().with_name("alacarte").name(), "alacarte");
    }

    #[test]
    fn name_falls_back_when_root_has_no_file_name() {
        let d = DeploymentDescriptor::new("/", BTreeMap::new(), None);
        assert_eq!(d.name(), "application");
    }

    #[test]
    fn equal_descriptors_share_digest() {
        let a = sample().digest().expect("digest");
        let b = sample().digest().expect("digest");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn environment_change_alters_digest() {
        let a = sample().digest().expect("digest");
        let mut env = sample().environment().clone();
        let _ = env.insert("EXTRA".into(), "1".into());
        let b = DeploymentDescriptor::new("/srv/apps/alacarte/services", env, Some("1.9".into()))
            .digest()
            .expect("digest");
        assert_ne!(a, b);
    }
}
