//! 本地目录枚举

use crate::services::config::TreeConfig;
use crate::services::ports::{DirEntryInfo, DirectoryEnumerator, EnumerationError};
use std::fs;
use std::path::Path;

pub struct LocalEnumerator {
    ignored_names: Vec<String>,
}

impl LocalEnumerator {
    pub fn new(ignored_names: Vec<String>) -> Self {
        Self { ignored_names }
    }

    pub fn from_config(config: &TreeConfig) -> Self {
        Self::new(config.ignored_names.clone())
    }

    pub fn should_ignore(&self, name: &str) -> bool {
        self.ignored_names.iter().any(|ignored| ignored == name)
    }
}

impl Default for LocalEnumerator {
    fn default() -> Self {
        Self::from_config(&TreeConfig::default())
    }
}

impl DirectoryEnumerator for LocalEnumerator {
    fn enumerate(&self, path: &Path) -> Result<Vec<DirEntryInfo>, EnumerationError> {
        let wrap = |source| EnumerationError {
            path: path.to_path_buf(),
            source,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(wrap)? {
            let entry = entry.map_err(wrap)?;
            let name = entry.file_name().to_string_lossy().to_string();
            if self.should_ignore(&name) {
                continue;
            }
            // 不跟随符号链接，避免目录环
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push(DirEntryInfo { name, is_dir });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/services/enumerator.rs"]
mod tests;
