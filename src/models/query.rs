//! 树查询：扁平化、祖先范围、过滤搜索。全部只读。

use crate::models::{NodeId, WorkspaceTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub ignore_dot_prefixed: bool,
    pub ignore_tilde_prefixed: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            ignore_dot_prefixed: true,
            ignore_tilde_prefixed: true,
        }
    }
}

impl MatchOptions {
    fn skips(&self, name: &str) -> bool {
        (self.ignore_dot_prefixed && name.starts_with('.'))
            || (self.ignore_tilde_prefixed && name.starts_with('~'))
    }
}

impl WorkspaceTree {
    /// Pre-order flattening bounded by `max_depth`. Files yield themselves, folders
    /// yield themselves (unless `exclude_folders`) followed by their children.
    pub fn flatten_descendants(
        &self,
        id: NodeId,
        max_depth: i32,
        exclude_folders: bool,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.flatten_into(id, max_depth, exclude_folders, &mut out);
        out
    }

    fn flatten_into(&self, id: NodeId, depth: i32, exclude_folders: bool, out: &mut Vec<NodeId>) {
        if depth <= 0 || !self.contains(id) {
            return;
        }
        let Some(children) = self.children(id) else {
            out.push(id);
            return;
        };
        if !exclude_folders {
            out.push(id);
        }
        for &child in children {
            self.flatten_into(child, depth - 1, exclude_folders, out);
        }
    }

    /// Climbs at most `height` parents, then flattens from there with the same bound.
    pub fn flatten_ancestor_scope(
        &self,
        id: NodeId,
        height: i32,
        exclude_folders: bool,
    ) -> Vec<NodeId> {
        let mut scope = id;
        for _ in 0..height.max(0) {
            match self.parent(scope) {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        self.flatten_descendants(scope, height, exclude_folders)
    }

    fn child_matches(&self, child: NodeId, query_lower: &str) -> bool {
        if self.is_folder(child) {
            self.count_matches_lowered(child, query_lower, MatchOptions::default()) > 0
        } else {
            self.file_name(child)
                .is_some_and(|name| name.to_lowercase().contains(query_lower))
        }
    }

    /// Number of immediate children matching `query`.
    ///
    /// Folder children count once when anything below them matches.
    /// An empty query counts every child that survives the prefix filters.
    pub fn count_matches(&self, id: NodeId, query: &str, options: MatchOptions) -> usize {
        self.count_matches_lowered(id, &query.to_lowercase(), options)
    }

    fn count_matches_lowered(&self, id: NodeId, query_lower: &str, options: MatchOptions) -> usize {
        let Some(children) = self.children(id) else {
            return 0;
        };
        children
            .iter()
            .filter(|&&child| {
                let Some(name) = self.file_name(child) else {
                    return false;
                };
                if options.skips(name) {
                    return false;
                }
                query_lower.is_empty() || self.child_matches(child, query_lower)
            })
            .count()
    }

    /// The children that [`WorkspaceTree::count_matches`] counts, in order.
    pub fn matching_children(&self, id: NodeId, query: &str, options: MatchOptions) -> Vec<NodeId> {
        let Some(children) = self.children(id) else {
            return Vec::new();
        };
        let query_lower = query.to_lowercase();
        children
            .iter()
            .copied()
            .filter(|&child| {
                let Some(name) = self.file_name(child) else {
                    return false;
                };
                if options.skips(name) {
                    return false;
                }
                query_lower.is_empty() || self.child_matches(child, &query_lower)
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/query.rs"]
mod tests;
