//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default base directory for Stagehand data when no home directory is usable.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/stagehand";

/// Returns the data directory, preferring `$HOME/.stagehand` and falling
/// back to `/var/lib/stagehand`.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        let user_dir = PathBuf::from(home).join(format!(".{APP_NAME}"));
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(SYSTEM_DATA_DIR)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// Returns the default state index path.
pub fn default_state_file() -> PathBuf {
    data_dir().join("state.json")
}

/// Manifest location inside an application root.
pub const DEFAULT_MANIFEST_PATH: &str = "config/stagehand.yml";

/// Runtime versions an environment accepts unless configured otherwise.
pub const DEFAULT_SUPPORTED_RUNTIMES: &[&str] = &["1.8", "1.9", "2.0"];

/// Runtime version assumed when a descriptor carries no version hint.
pub const DEFAULT_RUNTIME: &str = "1.9";

/// Prefix of service lookup names.
pub const SERVICE_PREFIX: &str = "service:";

/// Prefix of queue lookup names.
pub const QUEUE_PREFIX: &str = "/queue/";

/// Prefix of topic lookup names.
pub const TOPIC_PREFIX: &str = "/topic/";

/// Application name, used for the data directory and CLI output.
pub const APP_NAME: &str = "stagehand";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "stage";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_file_lives_under_app_directory() {
        let path = default_state_file();
        assert!(path.ends_with("state.json"));
        assert!(
            path.components()
                .any(|c| c.as_os_str().to_string_lossy().trim_start_matches('.') == APP_NAME),
            "got: {}",
            path.display()
        );
    }
}
