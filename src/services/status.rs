//! 版本控制状态表

use crate::models::{ChangeTag, ChangeTagProvider, GitFileStatus};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Change tags keyed by absolute path, fed from a status provider's output.
#[derive(Debug, Default, Clone)]
pub struct StatusTable {
    tags: FxHashMap<PathBuf, ChangeTag>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = (PathBuf, GitFileStatus)>,
    {
        let mut table = Self::new();
        table.replace(statuses);
        table
    }

    pub fn replace<I>(&mut self, statuses: I)
    where
        I: IntoIterator<Item = (PathBuf, GitFileStatus)>,
    {
        self.tags = statuses
            .into_iter()
            .filter_map(|(path, status)| status.primary_tag().map(|tag| (path, tag)))
            .collect();
    }

    pub fn insert(&mut self, path: PathBuf, tag: ChangeTag) {
        self.tags.insert(path, tag);
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &ChangeTag)> {
        self.tags.iter()
    }
}

impl ChangeTagProvider for StatusTable {
    fn change_tag(&self, path: &Path) -> Option<ChangeTag> {
        self.tags.get(path).copied()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/services/status.rs"]
mod tests;
