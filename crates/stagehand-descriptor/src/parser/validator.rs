//! Static validation of a deployment descriptor.
//!
//! Checks the shape of every field before anything touches an
//! environment. Reachability of the application root is left to the
//! environment performing the deployment.

use stagehand_common::error::Result;

use super::parse_err;
use crate::descriptor::DeploymentDescriptor;

/// Validates a descriptor for structural correctness.
///
/// # Checks performed
///
/// 1. The application root is not empty.
/// 2. Every environment variable name is a valid identifier.
/// 3. The runtime version, if given, is dot-separated numbers.
/// 4. The application environment and name, if given, are single words.
///
/// # Errors
///
/// Returns an error if any check fails.
pub fn validate(descriptor: &DeploymentDescriptor) -> Result<()> {
    tracing::debug!(name = %descriptor.name(), "validating deployment descriptor");
    check_root(descriptor)?;
    check_environment_names(descriptor)?;
    check_runtime_version(descriptor)?;
    check_words(descriptor)?;
    Ok(())
}

/// Returns whether `name` is usable as an environment variable name.
#[must_use]
pub fn is_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns whether `version` looks like `1`, `1.9` or `1.9.3`.
#[must_use]
pub fn is_version(version: &str) -> bool {
    !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

fn check_root(descriptor: &DeploymentDescriptor) -> Result<()> {
    if descriptor.application_root().as_os_str().is_empty() {
        return Err(parse_err("application root is empty".into()));
    }
    Ok(())
}

fn check_environment_names(descriptor: &DeploymentDescriptor) -> Result<()> {
    for key in descriptor.environment().keys() {
        if !is_env_var_name(key) {
            return Err(parse_err(format!(
                "invalid environment variable name: \"{key}\""
            )));
        }
    }
    Ok(())
}

fn check_runtime_version(descriptor: &DeploymentDescriptor) -> Result<()> {
    if let Some(version) = descriptor.runtime_version() {
        if !is_version(version) {
            return Err(parse_err(format!("invalid runtime version: \"{version}\"")));
        }
    }
    Ok(())
}

fn check_words(descriptor: &DeploymentDescriptor) -> Result<()> {
    let fields = [
        ("application.env", descriptor.application_env()),
        ("application.name", descriptor.explicit_name()),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '/') {
                return Err(parse_err(format!("invalid {field}: \"{value}\"")));
            }
        }
    }
    Ok(())
}
