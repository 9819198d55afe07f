//! 子树的结构化导出/导入（不含父引用与监听状态）

use crate::models::tree::Node;
use crate::models::{ChangeTag, NodeId, TreeError, WorkspaceTree};
use crate::services::config::TreeConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub identity: String,
    pub path: PathBuf,
    pub children: Option<Vec<NodeSnapshot>>,
    pub change_tag: Option<ChangeTag>,
}

impl NodeSnapshot {
    pub fn is_folder(&self) -> bool {
        self.children.is_some()
    }

    /// Nodes in this snapshot, itself included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(NodeSnapshot::node_count)
            .sum::<usize>()
    }
}

impl WorkspaceTree {
    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.get(id)?;
        let children = if node.is_folder() {
            Some(
                node.children()
                    .filter_map(|child| self.snapshot(child.id()))
                    .collect(),
            )
        } else {
            None
        };
        Some(NodeSnapshot {
            identity: node.identity().to_string(),
            path: node.path().to_path_buf(),
            children,
            change_tag: node.change_tag(),
        })
    }

    /// Rebuilds a tree rooted at `snapshot`. Identities are taken as stored.
    pub fn from_snapshot(snapshot: &NodeSnapshot, config: TreeConfig) -> Result<Self, TreeError> {
        let root = Node::new(
            snapshot.identity.clone(),
            snapshot.path.clone(),
            snapshot.is_folder(),
            snapshot.change_tag,
        );
        let mut tree = Self::with_root_node(root, config);

        let mut stack: Vec<(NodeId, &NodeSnapshot)> = vec![(tree.root(), snapshot)];
        while let Some((parent, snap)) = stack.pop() {
            for child in snap.children.iter().flatten() {
                let node = Node::new(
                    child.identity.clone(),
                    child.path.clone(),
                    child.is_folder(),
                    child.change_tag,
                );
                let id = tree.attach(parent, node)?;
                if child.is_folder() {
                    stack.push((id, child));
                }
            }
        }
        Ok(tree)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/snapshot.rs"]
mod tests;
