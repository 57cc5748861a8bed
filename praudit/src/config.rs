//! Optional per-repository configuration, read from the checked-out branch.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

/// Well-known config filename at the repository root.
pub const CONFIG_FILE: &str = ".npmAudit.json";

/// Recognized options from `.npmAudit.json`.
///
/// Unknown keys are ignored. The only recognized option points the scanner
/// at a subdirectory containing the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepoConfig {
    #[serde(rename = "packageLocation")]
    pub package_location: Option<String>,
}

impl RepoConfig {
    /// Reads the config file from a checked-out working copy.
    ///
    /// A missing file and a file that is not valid JSON both leave the
    /// configuration unset; neither stops the pipeline. A configured
    /// location that points outside the working copy is dropped the same
    /// way.
    pub fn load(workdir: &Path) -> Option<RepoConfig> {
        let path = workdir.join(CONFIG_FILE);

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => {
                info!(path = %path.display(), "no repository config found");
                return None;
            }
        };

        let mut config: RepoConfig = match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse repository config");
                return None;
            }
        };

        if let Some(location) = &config.package_location {
            if !contained_subdir(location) {
                warn!(location = %location, "ignoring package location outside the repository");
                config.package_location = None;
            }
        }

        Some(config)
    }
}

/// A usable package location is a relative path that stays inside the
/// working copy.
fn contained_subdir(location: &str) -> bool {
    let path = Path::new(location);
    !path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_) | std::path::Component::CurDir))
}
