//! 工作区文件树：磁盘目录子树的内存镜像
//!
//! 节点存放在 slotmap 中，父节点引用只是索引，所有权只沿 children 方向。
//! 监听回调运行在后台线程，只向队列投递消息；所有修改都在持有树的线程上完成。

use crate::models::{ChangeTag, ChangeTagProvider, FileType};
use crate::services::config::TreeConfig;
use crate::services::ports::DirectoryEnumerator;
use crate::services::watcher::{PathWatcher, WatchCallback, WatchError, WatchHub};
use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

new_key_type! { pub struct NodeId; }

/// Identity of the workspace root node.
pub const ROOT_IDENTITY: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    ParentNotDirectory,
    NameExists,
    InvalidNodeId,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::ParentNotDirectory => write!(f, "parent is not a directory"),
            TreeError::NameExists => write!(f, "identity already exists in tree"),
            TreeError::InvalidNodeId => write!(f, "invalid node id"),
        }
    }
}

impl std::error::Error for TreeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeIcon {
    File(FileType),
    /// Directory that is not monitored yet.
    Unknown,
    RootFolder,
    ConfigFolder,
    FolderFilled,
    FolderEmpty,
}

#[derive(Debug)]
pub enum TreeMessage {
    Refresh { node: NodeId, changed: PathBuf },
    ChangeTags(Vec<(PathBuf, Option<ChangeTag>)>),
}

/// Cloneable handle for posting work to the thread that owns the tree.
#[derive(Clone)]
pub struct TreeSender {
    tx: Sender<TreeMessage>,
}

impl TreeSender {
    pub fn request_refresh(&self, node: NodeId, changed: PathBuf) -> bool {
        self.tx.send(TreeMessage::Refresh { node, changed }).is_ok()
    }

    pub fn post_change_tags(&self, tags: Vec<(PathBuf, Option<ChangeTag>)>) -> bool {
        self.tx.send(TreeMessage::ChangeTags(tags)).is_ok()
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) identity: String,
    pub(crate) path: PathBuf,
    pub(crate) name: CompactString,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Option<Vec<NodeId>>,
    pub(crate) change_tag: Option<ChangeTag>,
    pub(crate) watcher: Option<PathWatcher>,
    pub(crate) expansion_requested: bool,
    pub(crate) instance_tag: u64,
}

impl Node {
    pub(crate) fn new(
        identity: String,
        path: PathBuf,
        is_dir: bool,
        change_tag: Option<ChangeTag>,
    ) -> Self {
        let name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_else(|| CompactString::new(path.to_string_lossy()));
        Self {
            identity,
            path,
            name,
            parent: None,
            children: is_dir.then(Vec::new),
            change_tag,
            watcher: None,
            expansion_requested: false,
            instance_tag: rand::random::<u64>(),
        }
    }
}

pub struct WorkspaceTree {
    arena: SlotMap<NodeId, Node>,
    root: NodeId,
    absolute_root: PathBuf,
    id_by_identity: FxHashMap<String, NodeId>,
    config: TreeConfig,
    hub: Option<WatchHub>,
    tx: Sender<TreeMessage>,
    rx: Receiver<TreeMessage>,
}

impl WorkspaceTree {
    /// Creates a tree holding only an empty root directory.
    pub fn new(root_path: &Path, config: TreeConfig) -> Self {
        let absolute_root = root_path
            .canonicalize()
            .unwrap_or_else(|_| root_path.to_path_buf());
        let root_node = Node::new(ROOT_IDENTITY.to_string(), absolute_root.clone(), true, None);
        Self::with_root_node(root_node, config)
    }

    pub(crate) fn with_root_node(root_node: Node, config: TreeConfig) -> Self {
        let absolute_root = root_node.path.clone();
        let mut arena = SlotMap::with_key();
        let mut id_by_identity = FxHashMap::default();
        let identity = root_node.identity.clone();
        let root = arena.insert(root_node);
        id_by_identity.insert(identity, root);

        let (tx, rx) = mpsc::channel();
        Self {
            arena,
            root,
            absolute_root,
            id_by_identity,
            config,
            hub: None,
            tx,
            rx,
        }
    }

    /// Scans `root_path` recursively. Unreadable directories end up with no children.
    pub fn open(
        root_path: &Path,
        config: TreeConfig,
        enumerator: &dyn DirectoryEnumerator,
        tags: &dyn ChangeTagProvider,
    ) -> Self {
        let mut tree = Self::new(root_path, config);
        let root = tree.root;
        if let Some(node) = tree.arena.get_mut(root) {
            node.change_tag = tags.change_tag(&node.path);
        }
        tree.scan(root, enumerator, tags);
        tracing::info!(
            root = %tree.absolute_root.display(),
            nodes = tree.arena.len(),
            "workspace tree opened"
        );
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn absolute_root(&self) -> &Path {
        &self.absolute_root
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains_key(id)
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    pub fn sender(&self) -> TreeSender {
        TreeSender {
            tx: self.tx.clone(),
        }
    }

    /// Live watch registrations across the tree.
    pub fn watched_count(&self) -> usize {
        self.hub.as_ref().map(WatchHub::active_count).unwrap_or(0)
    }

    // ---- accessors ----

    pub fn identity(&self, id: NodeId) -> Option<&str> {
        self.arena.get(id).map(|n| n.identity.as_str())
    }

    pub fn path(&self, id: NodeId) -> Option<&Path> {
        self.arena.get(id).map(|n| n.path.as_path())
    }

    pub fn file_name(&self, id: NodeId) -> Option<&str> {
        self.arena.get(id).map(|n| n.name.as_str())
    }

    pub fn title(&self, id: NodeId) -> Option<&str> {
        self.file_name(id)
    }

    /// File name, optionally without its extension.
    pub fn file_name_with(&self, id: NodeId, type_hidden: bool) -> Option<String> {
        let node = self.arena.get(id)?;
        if !type_hidden {
            return Some(node.name.to_string());
        }
        Some(
            node.path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| node.name.to_string()),
        )
    }

    pub fn file_type(&self, id: NodeId) -> Option<FileType> {
        self.arena.get(id).map(|n| FileType::from_path(&n.path))
    }

    pub fn is_folder(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .map(|n| n.children.is_some())
            .unwrap_or(false)
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .map(|n| n.parent.is_none())
            .unwrap_or(false)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> Option<&[NodeId]> {
        self.arena
            .get(id)
            .and_then(|n| n.children.as_deref())
    }

    pub fn change_tag(&self, id: NodeId) -> Option<ChangeTag> {
        self.arena.get(id).and_then(|n| n.change_tag)
    }

    /// Marker of the change tag, or an empty string.
    pub fn change_tag_label(&self, id: NodeId) -> String {
        self.change_tag(id)
            .map(|tag| tag.to_string())
            .unwrap_or_default()
    }

    pub fn is_watched(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .is_some_and(|n| n.watcher.as_ref().is_some_and(PathWatcher::is_active))
    }

    pub fn expansion_requested(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .map(|n| n.expansion_requested)
            .unwrap_or(false)
    }

    pub fn set_expansion_requested(&mut self, id: NodeId, requested: bool) {
        if let Some(node) = self.arena.get_mut(id) {
            node.expansion_requested = requested;
        }
    }

    pub fn find_by_identity(&self, identity: &str) -> Option<NodeId> {
        self.id_by_identity.get(identity).copied()
    }

    pub fn find_by_path(&self, path: &Path) -> Option<NodeId> {
        if path == self.absolute_root {
            return Some(self.root);
        }
        let relative = path.strip_prefix(&self.absolute_root).ok()?;
        let parts = relative
            .components()
            .map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        let root_identity = self.identity(self.root)?;
        let mut identity = String::new();
        if root_identity != ROOT_IDENTITY {
            identity.push_str(root_identity);
        }
        for part in parts {
            if !identity.is_empty() {
                identity.push('/');
            }
            identity.push_str(&part);
        }
        self.find_by_identity(&identity)
    }

    pub fn depth_of(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    // ---- mutation ----

    fn child_identity(parent_identity: &str, name: &str) -> String {
        if parent_identity == ROOT_IDENTITY {
            name.to_string()
        } else {
            format!("{}/{}", parent_identity, name)
        }
    }

    /// Attaches `node` under `parent`, keeping children sorted by name.
    pub(crate) fn attach(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, TreeError> {
        {
            let parent_ro = self.arena.get(parent).ok_or(TreeError::InvalidNodeId)?;
            if parent_ro.children.is_none() {
                return Err(TreeError::ParentNotDirectory);
            }
        }
        if self.id_by_identity.contains_key(&node.identity) {
            return Err(TreeError::NameExists);
        }

        node.parent = Some(parent);
        let identity = node.identity.clone();
        let name = node.name.clone();
        let id = self.arena.insert(node);
        self.id_by_identity.insert(identity, id);

        let arena = &self.arena;
        let pos = arena[parent]
            .children
            .as_ref()
            .map(|c| c.partition_point(|&child| arena[child].name <= name))
            .unwrap_or(0);
        if let Some(children) = self.arena[parent].children.as_mut() {
            children.insert(pos, id);
        }
        Ok(id)
    }

    fn make_node(
        &self,
        parent: NodeId,
        name: &str,
        is_dir: bool,
        change_tag: Option<ChangeTag>,
    ) -> Result<Node, TreeError> {
        let parent_node = self.arena.get(parent).ok_or(TreeError::InvalidNodeId)?;
        Ok(Node::new(
            Self::child_identity(&parent_node.identity, name),
            parent_node.path.join(name),
            is_dir,
            change_tag,
        ))
    }

    pub fn insert_child(
        &mut self,
        parent: NodeId,
        name: &str,
        is_dir: bool,
    ) -> Result<NodeId, TreeError> {
        self.insert_child_with_tag(parent, name, is_dir, None)
    }

    pub fn insert_child_with_tag(
        &mut self,
        parent: NodeId,
        name: &str,
        is_dir: bool,
        change_tag: Option<ChangeTag>,
    ) -> Result<NodeId, TreeError> {
        let node = self.make_node(parent, name, is_dir, change_tag)?;
        self.attach(parent, node)
    }

    /// Detaches `id` and drops its subtree, cancelling any watchers in it.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::InvalidNodeId);
        }
        let parent = self
            .arena
            .get(id)
            .ok_or(TreeError::InvalidNodeId)?
            .parent;
        if let Some(children) = parent
            .and_then(|p| self.arena.get_mut(p))
            .and_then(|n| n.children.as_mut())
        {
            children.retain(|&child| child != id);
        }
        self.drop_subtree(id);
        Ok(())
    }

    fn drop_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            let Some(mut node) = self.arena.remove(node_id) else {
                continue;
            };
            if let Some(mut watcher) = node.watcher.take() {
                watcher.cancel();
            }
            if self.id_by_identity.get(&node.identity) == Some(&node_id) {
                self.id_by_identity.remove(&node.identity);
            }
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
    }

    /// Fills `dir` and its subdirectories from the enumerator, honouring `scan_depth_limit`.
    fn scan(
        &mut self,
        dir: NodeId,
        enumerator: &dyn DirectoryEnumerator,
        tags: &dyn ChangeTagProvider,
    ) {
        let base_depth = self.depth_of(dir);
        let mut stack = vec![(dir, base_depth)];
        while let Some((id, depth)) = stack.pop() {
            if self
                .config
                .scan_depth_limit
                .is_some_and(|limit| depth >= limit)
            {
                continue;
            }
            let Some(path) = self.path(id).map(Path::to_path_buf) else {
                continue;
            };
            let entries = match enumerator.enumerate(&path) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(error = %e, "directory listing failed, treating as empty");
                    continue;
                }
            };
            for entry in entries {
                let child_path = path.join(&entry.name);
                let tag = tags.change_tag(&child_path);
                let node = match self.make_node(id, &entry.name, entry.is_dir, tag) {
                    Ok(node) => node,
                    Err(_) => continue,
                };
                match self.attach(id, node) {
                    Ok(child) if entry.is_dir => stack.push((child, depth + 1)),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(path = %child_path.display(), error = %e, "skipping entry");
                    }
                }
            }
        }
    }

    /// Re-enumerates `id` and re-reads change tags. Surviving children keep their ids.
    pub fn refresh(
        &mut self,
        id: NodeId,
        enumerator: &dyn DirectoryEnumerator,
        tags: &dyn ChangeTagProvider,
    ) {
        let Some(node) = self.arena.get_mut(id) else {
            return;
        };
        node.change_tag = tags.change_tag(&node.path);
        if node.watcher.as_ref().is_some_and(|w| !w.is_active()) {
            // 目录被删除或重建过，下次渲染时重新监听
            tracing::debug!(identity = %node.identity, "dropping stale watcher");
            node.watcher = None;
        }
        let Some(old_children) = node.children.clone() else {
            return;
        };
        let path = node.path.clone();
        tracing::debug!(identity = %node.identity, "refreshing directory");

        let entries = match enumerator.enumerate(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "directory listing failed, treating as empty");
                Vec::new()
            }
        };

        let mut existing: FxHashMap<CompactString, NodeId> = old_children
            .iter()
            .filter_map(|&child| self.arena.get(child).map(|n| (n.name.clone(), child)))
            .collect();
        if let Some(children) = self.arena.get_mut(id).and_then(|n| n.children.as_mut()) {
            children.clear();
        }

        let mut new_dirs = Vec::new();
        for entry in entries {
            let child_path = path.join(&entry.name);
            let tag = tags.change_tag(&child_path);
            if let Some(child) = existing.remove(entry.name.as_str()) {
                if self.is_folder(child) == entry.is_dir {
                    if let Some(child_node) = self.arena.get_mut(child) {
                        child_node.change_tag = tag;
                    }
                    if let Some(children) = self.arena.get_mut(id).and_then(|n| n.children.as_mut()) {
                        children.push(child);
                    }
                    continue;
                }
                self.drop_subtree(child);
            }

            let node = match self.make_node(id, &entry.name, entry.is_dir, tag) {
                Ok(node) => node,
                Err(_) => continue,
            };
            match self.attach(id, node) {
                Ok(child) if entry.is_dir => new_dirs.push(child),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(path = %child_path.display(), error = %e, "skipping entry");
                }
            }
        }

        for (_, stale) in existing {
            self.drop_subtree(stale);
        }

        // attach 已按名称插入，这里统一再排一次，保证与枚举顺序无关
        let arena = &self.arena;
        let mut ordered = arena[id].children.clone().unwrap_or_default();
        ordered.sort_by(|&a, &b| arena[a].name.cmp(&arena[b].name));
        if let Some(children) = self.arena.get_mut(id).and_then(|n| n.children.as_mut()) {
            *children = ordered;
        }

        for dir in new_dirs {
            self.scan(dir, enumerator, tags);
        }
    }

    // ---- monitoring ----

    /// Starts watching `id`. A no-op when a watcher is already active.
    pub fn activate_watcher(&mut self, id: NodeId) -> Result<(), WatchError> {
        let node = self.arena.get(id).ok_or_else(|| WatchError::OpenFailed {
            path: PathBuf::new(),
            reason: TreeError::InvalidNodeId.to_string(),
        })?;
        if node.watcher.as_ref().is_some_and(PathWatcher::is_active) {
            return Ok(());
        }
        let path = node.path.clone();

        let tx = self.tx.clone();
        let callback: WatchCallback = Arc::new(move |changed: &Path| {
            let _ = tx.send(TreeMessage::Refresh {
                node: id,
                changed: changed.to_path_buf(),
            });
        });
        let watcher = self.watch_hub()?.activate(&path, callback)?;
        if let Some(node) = self.arena.get_mut(id) {
            node.watcher = Some(watcher);
        }
        Ok(())
    }

    /// The shared backend, started on first use. A failed start is retried on the next call.
    fn watch_hub(&mut self) -> Result<&WatchHub, WatchError> {
        let hub = match self.hub.take() {
            Some(hub) => hub,
            None => WatchHub::new(self.config.poll_interval(), self.config.watcher_warn_threshold)?,
        };
        Ok(self.hub.insert(hub))
    }

    /// Makes sure a directory is monitored before it is drawn.
    ///
    /// While a search filter is active no new watchers are started, so
    /// directories surfaced only by the search stay unmonitored.
    pub fn ensure_monitored(&mut self, id: NodeId, filter: &str) -> bool {
        if !self.is_folder(id) {
            return false;
        }
        if self.is_watched(id) {
            return true;
        }
        if !filter.is_empty() {
            return false;
        }
        match self.activate_watcher(id) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "watcher activation failed");
                false
            }
        }
    }

    /// Pure icon decision; never starts a watcher.
    pub fn icon(&self, id: NodeId, filter: &str) -> Option<NodeIcon> {
        let node = self.arena.get(id)?;
        let Some(children) = &node.children else {
            return Some(NodeIcon::File(FileType::from_path(&node.path)));
        };
        if !self.is_watched(id) && filter.is_empty() {
            return Some(NodeIcon::Unknown);
        }
        let icon = if node.parent.is_none() {
            NodeIcon::RootFolder
        } else if node.name.as_str() == self.config.config_dir_name {
            NodeIcon::ConfigFolder
        } else if children.is_empty() {
            NodeIcon::FolderEmpty
        } else {
            NodeIcon::FolderFilled
        };
        Some(icon)
    }

    /// Icon for drawing: monitoring starts the first time a directory is rendered.
    pub fn render_icon(&mut self, id: NodeId, filter: &str) -> Option<NodeIcon> {
        self.ensure_monitored(id, filter);
        self.icon(id, filter)
    }

    // ---- message queue ----

    /// Applies queued watcher and change-tag messages without blocking.
    pub fn process_pending(
        &mut self,
        enumerator: &dyn DirectoryEnumerator,
        tags: &dyn ChangeTagProvider,
    ) -> Vec<NodeId> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        self.apply_messages(messages, enumerator, tags)
    }

    /// Blocks up to `timeout` for the first message, then drains the queue.
    pub fn wait_and_process(
        &mut self,
        timeout: Duration,
        enumerator: &dyn DirectoryEnumerator,
        tags: &dyn ChangeTagProvider,
    ) -> Vec<NodeId> {
        let first = match self.rx.recv_timeout(timeout) {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                return Vec::new();
            }
        };
        let mut messages = vec![first];
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        self.apply_messages(messages, enumerator, tags)
    }

    fn apply_messages(
        &mut self,
        messages: Vec<TreeMessage>,
        enumerator: &dyn DirectoryEnumerator,
        tags: &dyn ChangeTagProvider,
    ) -> Vec<NodeId> {
        let mut seen = FxHashSet::default();
        let mut refresh = Vec::new();

        for message in messages {
            match message {
                TreeMessage::Refresh { node, changed } => {
                    tracing::trace!(changed = %changed.display(), "watch event");
                    if seen.insert(node) {
                        refresh.push(node);
                    }
                }
                TreeMessage::ChangeTags(updates) => self.apply_change_tags(updates),
            }
        }

        refresh.sort_by_key(|&id| self.depth_of(id));
        let mut refreshed = Vec::with_capacity(refresh.len());
        for id in refresh {
            // 上层刷新可能已经移除了该节点
            if !self.arena.contains_key(id) {
                continue;
            }
            self.refresh(id, enumerator, tags);
            refreshed.push(id);
        }
        refreshed
    }

    fn apply_change_tags(&mut self, updates: Vec<(PathBuf, Option<ChangeTag>)>) {
        for (path, tag) in updates {
            match self.find_by_path(&path) {
                Some(id) => {
                    if let Some(node) = self.arena.get_mut(id) {
                        node.change_tag = tag;
                    }
                }
                None => {
                    tracing::trace!(path = %path.display(), "change tag for unknown path");
                }
            }
        }
    }
}

impl fmt::Debug for WorkspaceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceTree")
            .field("absolute_root", &self.absolute_root)
            .field("nodes", &self.arena.len())
            .field("watched", &self.watched_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/tree.rs"]
mod tests;
