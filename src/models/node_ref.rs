//! 节点只读视图：按 identity 比较

use crate::models::tree::Node;
use crate::models::{ChangeTag, FileType, NodeId, WorkspaceTree};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Borrowed view of one node.
///
/// Equality compares identities only, so views from different trees (or from
/// separate scans) of the same relative path are equal. Hashing also mixes in
/// a per-instance random tag: two separately created nodes that share an
/// identity are equal but do not collapse into one entry of a hash set.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a WorkspaceTree,
    id: NodeId,
    node: &'a Node,
}

impl WorkspaceTree {
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.node(id).map(|node| NodeRef {
            tree: self,
            id,
            node,
        })
    }
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn identity(&self) -> &'a str {
        &self.node.identity
    }

    pub fn path(&self) -> &'a Path {
        &self.node.path
    }

    pub fn name(&self) -> &'a str {
        &self.node.name
    }

    pub fn is_folder(&self) -> bool {
        self.node.children.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.node.parent.is_none()
    }

    pub fn file_type(&self) -> FileType {
        FileType::from_path(self.path())
    }

    pub fn change_tag(&self) -> Option<ChangeTag> {
        self.node.change_tag
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node.parent.and_then(|p| self.tree.get(p))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.node
            .children
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&child| tree.get(child))
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for NodeRef<'_> {}

impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.instance_tag.hash(state);
        self.identity().hash(state);
    }
}

/// Orders by final path component. Distinct identities with the same name are
/// incomparable.
impl PartialOrd for NodeRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.name().cmp(other.name()) {
            Ordering::Equal if self.identity() != other.identity() => None,
            ordering => Some(ordering),
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("identity", &self.identity())
            .field("folder", &self.is_folder())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/node_ref.rs"]
mod tests;
