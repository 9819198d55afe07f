//! 服务层：目录枚举、路径监听、配置、状态表

pub mod config;
pub mod enumerator;
pub mod icons;
pub mod paths;
pub mod ports;
pub mod status;
pub mod watcher;

pub use config::{ensure_config_file, load_config, TreeConfig};
pub use enumerator::LocalEnumerator;
pub use icons::PlainIconTable;
pub use paths::{ensure_log_dir, get_app_data_dir, get_config_path, get_log_dir};
pub use ports::{DirEntryInfo, DirectoryEnumerator, EnumerationError, IconTable, Rgb};
pub use status::StatusTable;
pub use watcher::{PathWatcher, WatchCallback, WatchError, WatchHub};
