//! Persistent state management.
//!
//! Maintains a local JSON index of deployments so the CLI can report what
//! was deployed by earlier invocations.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stagehand_common::error::{Result, StagehandError};

use crate::environment::DeploymentSummary;

/// Top-level structure of the state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    /// Recorded deployments, at most one per name.
    pub deployments: Vec<DeploymentSummary>,
}

/// Loads the state index from disk.
///
/// Returns an empty index if the file does not exist yet.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_state(path: &Path) -> Result<StateFile> {
    tracing::debug!(path = %path.display(), "loading state index");
    if !path.exists() {
        return Ok(StateFile::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| StagehandError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Persists the state index to disk atomically.
///
/// Writes to a sibling temporary file and renames it over the target.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_state(path: &Path, state: &StateFile) -> Result<()> {
    tracing::debug!(path = %path.display(), deployments = state.deployments.len(), "saving state index");
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StagehandError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| StagehandError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| StagehandError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Records a deployment, replacing any earlier record with the same name.
///
/// # Errors
///
/// Returns an error if the index cannot be loaded or saved.
pub fn record(path: &Path, summary: &DeploymentSummary) -> Result<()> {
    let mut state = load_state(path)?;
    state.deployments.retain(|d| d.name != summary.name);
    state.deployments.push(summary.clone());
    save_state(path, &state)
}

/// Removes the record of the named deployment.
///
/// # Errors
///
/// Returns an error if the index cannot be loaded or saved.
pub fn forget(path: &Path, name: &str) -> Result<()> {
    let mut state = load_state(path)?;
    state.deployments.retain(|d| d.name != name);
    save_state(path, &state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use stagehand_common::types::{DeploymentId, ResourceName};

    use super::*;

    fn summary(name: &str, id: &str) -> DeploymentSummary {
        DeploymentSummary {
            id: DeploymentId::new(id),
            name: name.into(),
            digest: "ab".repeat(32),
            application_root: PathBuf::from("/srv/app"),
            runtime: "1.9".into(),
            resources: vec![ResourceName::Queue("container_queue".into())],
            deployed_at: "2026-01-01T00:00:00+00:00".into(),
        }
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = load_state(&dir.path().join("state.json")).expect("load");
        assert!(state.deployments.is_empty());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/state.json");
        save_state(&path, &StateFile::default()).expect("save");
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn record_replaces_same_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        record(&path, &summary("app", "one")).expect("record");
        record(&path, &summary("other", "two")).expect("record");
        record(&path, &summary("app", "three")).expect("record");

        let state = load_state(&path).expect("load");
        assert_eq!(state.deployments.len(), 2);
        let app = state.deployments.iter().find(|d| d.name == "app").expect("app");
        assert_eq!(app.id.as_str(), "three");
        assert_eq!(app.resources, vec![ResourceName::Queue("container_queue".into())]);
    }

    #[test]
    fn forget_removes_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        record(&path, &summary("app", "one")).expect("record");
        forget(&path, "app").expect("forget");
        assert!(load_state(&path).expect("load").deployments.is_empty());
    }

    #[test]
    fn corrupt_state_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(matches!(
            load_state(&path).unwrap_err(),
            StagehandError::Serialization { .. }
        ));
    }
}
