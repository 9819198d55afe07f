//! 工作区树配置

use crate::services::paths::get_config_path;
use crate::services::watcher::{DEFAULT_POLL_INTERVAL, DEFAULT_WARN_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_IGNORED: &[&str] = &[
    ".DS_Store",
    ".Spotlight-V100",
    ".Trashes",
    ".fseventsd",
    ".TemporaryItems",
    "Thumbs.db",
    "desktop.ini",
    ".git",
    "node_modules",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Entry names skipped by enumeration.
    pub ignored_names: Vec<String>,
    /// Folder name shown with the config icon.
    pub config_dir_name: String,
    pub watcher_warn_threshold: usize,
    pub poll_interval_ms: u64,
    pub scan_depth_limit: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            ignored_names: DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect(),
            config_dir_name: ".zcode".to_string(),
            watcher_warn_threshold: DEFAULT_WARN_THRESHOLD,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            scan_depth_limit: None,
        }
    }
}

impl TreeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(path).ok()?;
        match Self::from_json(&data) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid tree config, using defaults");
                None
            }
        }
    }
}

pub fn load_config() -> TreeConfig {
    get_config_path()
        .and_then(|path| TreeConfig::load_from(&path))
        .unwrap_or_default()
}

pub fn ensure_config_file() -> std::io::Result<PathBuf> {
    let path = get_config_path().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine config directory",
        )
    })?;
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        let content = serde_json::to_string_pretty(&TreeConfig::default())
            .unwrap_or_else(|_| "{}".to_string());
        std::fs::write(&path, content)?;
    }
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/services/config.rs"]
mod tests;
