//! 终端图标表

use crate::models::{FileType, NodeIcon};
use crate::services::ports::{IconTable, Rgb};

/// ASCII markers for terminal output.
pub struct PlainIconTable;

impl IconTable for PlainIconTable {
    fn symbol(&self, icon: NodeIcon) -> &str {
        match icon {
            NodeIcon::File(ft) if ft.is_image() => "[img]",
            NodeIcon::File(FileType::Lock) => "[lck]",
            NodeIcon::File(_) => "[   ]",
            NodeIcon::Unknown => "[ ? ]",
            NodeIcon::RootFolder => "[ # ]",
            NodeIcon::ConfigFolder => "[cfg]",
            NodeIcon::FolderFilled => "[ + ]",
            NodeIcon::FolderEmpty => "[ - ]",
        }
    }

    fn accent_color(&self, file_type: FileType) -> Option<Rgb> {
        match file_type {
            FileType::Rs => Some(Rgb(222, 165, 132)),
            FileType::Go => Some(Rgb(0, 173, 216)),
            FileType::Py => Some(Rgb(53, 114, 165)),
            FileType::Js | FileType::Jsx => Some(Rgb(241, 224, 90)),
            FileType::Ts | FileType::Tsx => Some(Rgb(49, 120, 198)),
            FileType::Swift => Some(Rgb(240, 81, 56)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/services/icons.rs"]
mod tests;
