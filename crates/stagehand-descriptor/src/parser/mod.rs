//! Deployment descriptor parser built on `serde_yaml`.
//!
//! Transforms raw descriptor text into a validated
//! [`DeploymentDescriptor`] through YAML decoding, normalization,
//! and static checks.

pub mod document;
pub mod validator;

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use stagehand_common::error::{Result, StagehandError};

use self::document::{DescriptorDocument, KNOWN_SECTIONS};
use crate::descriptor::DeploymentDescriptor;

pub(crate) const fn parse_err(message: String) -> StagehandError {
    StagehandError::Descriptor { message }
}

/// Parses a deployment descriptor.
///
/// A relative `application.root` is resolved against `base_dir` when one
/// is given, so descriptors can sit next to the applications they deploy.
///
/// # Errors
///
/// Returns an error if the text is not YAML, lacks `application.root`,
/// carries non-scalar environment values, or fails validation.
pub fn parse_descriptor(input: &str, base_dir: Option<&Path>) -> Result<DeploymentDescriptor> {
    tracing::debug!(bytes = input.len(), "parsing deployment descriptor");
    if input.trim().is_empty() {
        return Err(parse_err("descriptor is empty".into()));
    }

    let value: Value =
        serde_yaml::from_str(input).map_err(|e| parse_err(format!("invalid YAML: {e}")))?;
    let Value::Mapping(sections) = &value else {
        return Err(parse_err("descriptor must be a mapping of sections".into()));
    };
    for key in sections.keys() {
        let name = key.as_str().unwrap_or_default();
        if !KNOWN_SECTIONS.contains(&name) {
            tracing::warn!(section = ?key, "ignoring unknown descriptor section");
        }
    }

    let document: DescriptorDocument =
        serde_yaml::from_str(input).map_err(|e| parse_err(e.to_string()))?;
    let descriptor = build_descriptor(document, base_dir)?;
    validator::validate(&descriptor)?;
    Ok(descriptor)
}

/// Reads and parses a descriptor file, resolving relative roots against
/// the file's directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub fn parse_descriptor_file(path: &Path) -> Result<DeploymentDescriptor> {
    tracing::info!(path = %path.display(), "loading deployment descriptor");
    let content = std::fs::read_to_string(path).map_err(|e| StagehandError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_descriptor(&content, path.parent())
}

fn build_descriptor(
    document: DescriptorDocument,
    base_dir: Option<&Path>,
) -> Result<DeploymentDescriptor> {
    let application = document
        .application
        .ok_or_else(|| parse_err("missing `application` section".into()))?;
    let root = application
        .root
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| parse_err("missing `application.root`".into()))?;

    let environment = document
        .environment
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect();
    let runtime_version = document.runtime.and_then(|r| r.version);

    let mut descriptor =
        DeploymentDescriptor::new(resolve_root(&root, base_dir), environment, runtime_version);
    if let Some(env) = application.env {
        descriptor = descriptor.with_application_env(env);
    }
    if let Some(name) = application.name {
        descriptor = descriptor.with_name(name);
    }
    Ok(descriptor)
}

fn resolve_root(root: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(root.trim());
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}
