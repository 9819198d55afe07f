//! zcode-workspace - 工作区文件树
//!
//! 模块结构：
//! - models: 数据模型（WorkspaceTree, NodeRef, 查询, 快照）
//! - services: 服务层（目录枚举, 路径监听, 配置, 状态表）

pub mod models;
pub mod services;

pub use models::{MatchOptions, NodeIcon, NodeId, WorkspaceTree};
pub use services::{LocalEnumerator, TreeConfig, WatchError};
