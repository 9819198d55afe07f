//! 扩展名 -> 文件类型

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Txt,
    Md,
    Json,
    Toml,
    Yaml,
    Xml,
    Html,
    Css,
    Js,
    Ts,
    Jsx,
    Tsx,
    Rs,
    Go,
    Py,
    C,
    H,
    Cpp,
    Hpp,
    Java,
    Kt,
    Swift,
    Rb,
    Sh,
    Sql,
    Lock,
    Png,
    Jpg,
    Svg,
    Pdf,
}

impl FileType {
    /// Unknown or missing extensions map to [`FileType::Txt`].
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "md" | "markdown" => Self::Md,
            "json" => Self::Json,
            "toml" => Self::Toml,
            "yml" | "yaml" => Self::Yaml,
            "xml" | "plist" => Self::Xml,
            "html" | "htm" => Self::Html,
            "css" | "scss" => Self::Css,
            "js" | "mjs" | "cjs" => Self::Js,
            "ts" => Self::Ts,
            "jsx" => Self::Jsx,
            "tsx" => Self::Tsx,
            "rs" => Self::Rs,
            "go" => Self::Go,
            "py" => Self::Py,
            "c" => Self::C,
            "h" => Self::H,
            "cc" | "cpp" | "cxx" => Self::Cpp,
            "hh" | "hpp" | "hxx" => Self::Hpp,
            "java" => Self::Java,
            "kt" | "kts" => Self::Kt,
            "swift" => Self::Swift,
            "rb" => Self::Rb,
            "sh" | "bash" | "zsh" => Self::Sh,
            "sql" => Self::Sql,
            "lock" => Self::Lock,
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpg,
            "svg" => Self::Svg,
            "pdf" => Self::Pdf,
            _ => Self::Txt,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .map(|ext| Self::from_extension(&ext.to_string_lossy()))
            .unwrap_or(Self::Txt)
    }

    pub fn is_image(self) -> bool {
        matches!(self, Self::Png | Self::Jpg | Self::Svg)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/file_type.rs"]
mod tests;
