//! 版本控制状态标签
//!
//! 状态由外部子系统计算，树只负责保存和展示。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeTag {
    Modified,
    Added,
    Deleted,
    Renamed,
    Untracked,
    Conflict,
}

impl ChangeTag {
    pub fn marker(self) -> char {
        match self {
            Self::Modified => 'M',
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Renamed => 'R',
            Self::Untracked => '?',
            Self::Conflict => 'U',
        }
    }

    pub fn from_marker(ch: char) -> Option<Self> {
        match ch {
            'M' => Some(Self::Modified),
            'A' => Some(Self::Added),
            'D' => Some(Self::Deleted),
            'R' => Some(Self::Renamed),
            '?' => Some(Self::Untracked),
            'U' => Some(Self::Conflict),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

/// Index/worktree pair as reported by a status provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GitFileStatus {
    pub index: Option<ChangeTag>,
    pub worktree: Option<ChangeTag>,
}

impl GitFileStatus {
    pub fn primary_tag(&self) -> Option<ChangeTag> {
        const PRIORITY: [ChangeTag; 6] = [
            ChangeTag::Conflict,
            ChangeTag::Untracked,
            ChangeTag::Added,
            ChangeTag::Deleted,
            ChangeTag::Renamed,
            ChangeTag::Modified,
        ];
        PRIORITY
            .into_iter()
            .find(|tag| self.index == Some(*tag) || self.worktree == Some(*tag))
    }
}

/// 外部状态来源
pub trait ChangeTagProvider {
    fn change_tag(&self, path: &Path) -> Option<ChangeTag>;
}

/// Provider for trees that carry no version-control status.
pub struct NoChangeTags;

impl ChangeTagProvider for NoChangeTags {
    fn change_tag(&self, _path: &Path) -> Option<ChangeTag> {
        None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/change_tag.rs"]
mod tests;
