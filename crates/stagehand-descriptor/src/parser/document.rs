//! Raw document shapes read from YAML before validation.
//!
//! Scalar fields are declared as strings so plain YAML scalars keep their
//! literal text: `version: 1.10` reads as `"1.10"`, not as a float.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level sections recognized in a deployment descriptor.
pub const KNOWN_SECTIONS: &[&str] = &["application", "environment", "runtime", "ruby"];

/// Root node of a parsed descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptorDocument {
    /// `application:` section.
    pub application: Option<ApplicationSection>,
    /// `environment:` section; an empty value reads as `None`.
    pub environment: Option<BTreeMap<String, Option<String>>>,
    /// `runtime:` section, also accepted as `ruby:`.
    #[serde(alias = "ruby")]
    pub runtime: Option<RuntimeSection>,
}

/// The `application:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationSection {
    /// Application root directory.
    pub root: Option<String>,
    /// Application environment name.
    pub env: Option<String>,
    /// Optional deployment name.
    pub name: Option<String>,
}

/// The `runtime:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeSection {
    /// Version hint, e.g. `1.9`.
    pub version: Option<String>,
}
