//! 数据模型层

pub mod change_tag;
pub mod file_type;
pub mod node_ref;
pub mod query;
pub mod snapshot;
pub mod tree;

pub use change_tag::{ChangeTag, ChangeTagProvider, GitFileStatus, NoChangeTags};
pub use file_type::FileType;
pub use node_ref::NodeRef;
pub use query::MatchOptions;
pub use snapshot::NodeSnapshot;
pub use tree::{NodeIcon, NodeId, TreeError, TreeMessage, TreeSender, WorkspaceTree, ROOT_IDENTITY};
