//! 路径监听：所有节点共享同一个 notify 后端，每个被监听路径一条路由。
//!
//! 回调在 notify 的后台线程上执行，调用方负责把变更转交给持有树的线程。

use notify::event::ModifyKind;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
pub const DEFAULT_WARN_THRESHOLD: usize = 2000;

/// Invoked with the changed path (the watched path itself or one of its entries).
pub type WatchCallback = Arc<dyn Fn(&Path) + Send + Sync>;

#[derive(Debug)]
pub enum WatchError {
    OpenFailed { path: PathBuf, reason: String },
    BackendUnavailable(String),
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchError::OpenFailed { path, reason } => {
                write!(f, "failed to watch {}: {}", path.display(), reason)
            }
            WatchError::BackendUnavailable(reason) => {
                write!(f, "watch backend unavailable: {}", reason)
            }
        }
    }
}

impl std::error::Error for WatchError {}

struct Route {
    token: u64,
    callback: WatchCallback,
    /// Set once the watched path itself was removed or renamed.
    lost: Arc<AtomicBool>,
}

#[derive(Default)]
struct RouteTable {
    routes: Mutex<FxHashMap<PathBuf, Vec<Route>>>,
}

impl RouteTable {
    fn dispatch(&self, kind: &EventKind, paths: &[PathBuf]) {
        let replaces_target = replaces_watched_path(kind);
        let mut fired = FxHashSet::default();
        let mut pending: Vec<(WatchCallback, PathBuf)> = Vec::new();

        if let Ok(mut routes) = self.routes.lock() {
            for path in paths {
                let keys = std::iter::once(path.as_path()).chain(path.parent());
                for key in keys {
                    let Some(entries) = routes.get(key) else {
                        continue;
                    };
                    for route in entries {
                        if fired.insert(route.token) {
                            pending.push((route.callback.clone(), path.clone()));
                        }
                    }
                }

                // 被监听目录本身消失：后端已丢弃该 watch，路由随之失效
                if replaces_target {
                    if let Some(entries) = routes.remove(path.as_path()) {
                        for route in entries {
                            route.lost.store(true, Ordering::Release);
                        }
                    }
                }
            }
        }

        for (callback, path) in pending {
            callback(&path);
        }
    }

    fn insert(&self, path: &Path, route: Route) -> bool {
        let Ok(mut routes) = self.routes.lock() else {
            return false;
        };
        let entries = routes.entry(path.to_path_buf()).or_default();
        entries.push(route);
        entries.len() == 1
    }

    /// Returns true when the last route for `path` went away.
    fn remove(&self, path: &Path, token: u64) -> bool {
        let Ok(mut routes) = self.routes.lock() else {
            return false;
        };
        let Some(entries) = routes.get_mut(path) else {
            return false;
        };
        entries.retain(|route| route.token != token);
        if entries.is_empty() {
            routes.remove(path);
            true
        } else {
            false
        }
    }
}

struct HubShared {
    routes: Arc<RouteTable>,
    backend: Mutex<RecommendedWatcher>,
    active: AtomicUsize,
    warn_threshold: usize,
}

impl HubShared {
    fn release(&self, path: &Path, token: u64) {
        if self.routes.remove(path, token) {
            if let Ok(mut backend) = self.backend.lock() {
                if let Err(e) = backend.unwatch(path) {
                    tracing::debug!(path = %path.display(), error = %e, "unwatch failed");
                }
            }
        }
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Events after which the inode behind a watched path is no longer the one watched.
fn replaces_watched_path(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}

fn is_write_event(kind: &EventKind) -> bool {
    match kind {
        EventKind::Any | EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(modify) => !matches!(modify, ModifyKind::Metadata(_)),
        EventKind::Access(_) | EventKind::Other => false,
    }
}

pub struct WatchHub {
    shared: Arc<HubShared>,
    next_token: AtomicU64,
}

impl WatchHub {
    pub fn new(poll_interval: Duration, warn_threshold: usize) -> Result<Self, WatchError> {
        let routes = Arc::new(RouteTable::default());
        let handler_routes = Arc::clone(&routes);
        let backend = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                if is_write_event(&event.kind) {
                    handler_routes.dispatch(&event.kind, &event.paths);
                }
            },
            Config::default().with_poll_interval(poll_interval),
        )
        .map_err(|e| WatchError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            shared: Arc::new(HubShared {
                routes,
                backend: Mutex::new(backend),
                active: AtomicUsize::new(0),
                warn_threshold,
            }),
            next_token: AtomicU64::new(1),
        })
    }

    /// Number of live [`PathWatcher`] handles.
    pub fn active_count(&self) -> usize {
        self.shared.active.load(Ordering::Acquire)
    }

    pub fn activate(&self, path: &Path, callback: WatchCallback) -> Result<PathWatcher, WatchError> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let lost = Arc::new(AtomicBool::new(false));
        let route = Route {
            token,
            callback,
            lost: Arc::clone(&lost),
        };
        let first = self.shared.routes.insert(path, route);

        if first {
            let result = match self.shared.backend.lock() {
                Ok(mut backend) => backend.watch(path, RecursiveMode::NonRecursive),
                Err(_) => Err(notify::Error::generic("watch backend lock poisoned")),
            };
            if let Err(e) = result {
                self.shared.routes.remove(path, token);
                return Err(WatchError::OpenFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }

        let active = self.shared.active.fetch_add(1, Ordering::AcqRel) + 1;
        if active > self.shared.warn_threshold {
            tracing::info!(active, path = %path.display(), "watcher descriptors in use");
        }

        Ok(PathWatcher {
            path: path.to_path_buf(),
            token,
            lost,
            hub: Some(Arc::clone(&self.shared)),
        })
    }
}

/// A live registration for one path. Cancelled on drop.
pub struct PathWatcher {
    path: PathBuf,
    token: u64,
    lost: Arc<AtomicBool>,
    hub: Option<Arc<HubShared>>,
}

impl PathWatcher {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// False after `cancel`, and after the watched path was removed or renamed away.
    pub fn is_active(&self) -> bool {
        self.hub.is_some() && !self.lost.load(Ordering::Acquire)
    }

    pub fn cancel(&mut self) {
        let Some(hub) = self.hub.take() else {
            return;
        };
        hub.release(&self.path, self.token);
    }
}

impl Drop for PathWatcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for PathWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathWatcher")
            .field("path", &self.path)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/services/watcher.rs"]
mod tests;
