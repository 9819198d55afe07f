//! Service ports: traits + data contracts.

use crate::models::{FileType, NodeIcon};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug)]
pub struct EnumerationError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for EnumerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to list {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for EnumerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Lists the immediate entries of a directory.
pub trait DirectoryEnumerator {
    fn enumerate(&self, path: &Path) -> Result<Vec<DirEntryInfo>, EnumerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// 图标/颜色查找表，数据由宿主提供
pub trait IconTable {
    fn symbol(&self, icon: NodeIcon) -> &str;

    fn accent_color(&self, _file_type: FileType) -> Option<Rgb> {
        None
    }
}
