use super::*;
use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};
use std::io;
use std::sync::mpsc;
use std::time::Instant;

const CREATE: EventKind = EventKind::Create(CreateKind::File);
const REMOVE_DIR: EventKind = EventKind::Remove(RemoveKind::Folder);

fn recording_callback() -> (WatchCallback, mpsc::Receiver<PathBuf>) {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let callback: WatchCallback = Arc::new(move |path: &Path| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(path.to_path_buf());
        }
    });
    (callback, rx)
}

fn route(token: u64, callback: &WatchCallback) -> (Route, Arc<AtomicBool>) {
    let lost = Arc::new(AtomicBool::new(false));
    let route = Route {
        token,
        callback: Arc::clone(callback),
        lost: Arc::clone(&lost),
    };
    (route, lost)
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn text(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut inner) = self.0.lock() {
            inner.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_write_events_are_filtered() {
    assert!(is_write_event(&EventKind::Create(CreateKind::File)));
    assert!(is_write_event(&EventKind::Remove(RemoveKind::Folder)));
    assert!(is_write_event(&EventKind::Modify(ModifyKind::Data(
        DataChange::Content
    ))));
    assert!(is_write_event(&EventKind::Any));
    assert!(!is_write_event(&EventKind::Modify(ModifyKind::Metadata(
        MetadataKind::Permissions
    ))));
    assert!(!is_write_event(&EventKind::Access(AccessKind::Any)));
    assert!(!is_write_event(&EventKind::Other));
}

#[test]
fn test_dispatch_matches_path_or_parent() {
    let table = RouteTable::default();
    let (callback, rx) = recording_callback();
    table.insert(Path::new("/watched/dir"), route(1, &callback).0);

    table.dispatch(&CREATE, &[PathBuf::from("/watched/dir/new.txt")]);
    assert_eq!(rx.try_recv().ok(), Some(PathBuf::from("/watched/dir/new.txt")));

    table.dispatch(&CREATE, &[PathBuf::from("/watched/dir")]);
    assert_eq!(rx.try_recv().ok(), Some(PathBuf::from("/watched/dir")));

    table.dispatch(&CREATE, &[PathBuf::from("/elsewhere/file.txt")]);
    table.dispatch(&CREATE, &[PathBuf::from("/watched/dir/sub/deeper.txt")]);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_dispatch_fires_each_route_once_per_event() {
    let table = RouteTable::default();
    let (callback, rx) = recording_callback();
    table.insert(Path::new("/w"), route(7, &callback).0);

    // rename 事件同时带旧路径和新路径
    table.dispatch(
        &EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
        &[PathBuf::from("/w/old.txt"), PathBuf::from("/w/new.txt")],
    );
    assert_eq!(rx.try_iter().count(), 1);
}

#[test]
fn test_route_table_reports_first_and_last() {
    let table = RouteTable::default();
    let (callback, _rx) = recording_callback();
    let path = Path::new("/shared");

    assert!(table.insert(path, route(1, &callback).0));
    assert!(!table.insert(path, route(2, &callback).0));
    assert!(!table.remove(path, 1));
    assert!(table.remove(path, 2));
    assert!(!table.remove(path, 2));
}

#[test]
fn test_activate_and_cancel_tracks_active_count() {
    let dir = tempfile::tempdir().unwrap();
    let hub = WatchHub::new(DEFAULT_POLL_INTERVAL, DEFAULT_WARN_THRESHOLD).unwrap();
    let (callback, _rx) = recording_callback();

    let mut first = hub.activate(dir.path(), Arc::clone(&callback)).unwrap();
    let second = hub.activate(dir.path(), callback).unwrap();
    assert_eq!(hub.active_count(), 2);
    assert!(first.is_active());
    assert_eq!(first.path(), dir.path());

    first.cancel();
    assert!(!first.is_active());
    assert_eq!(hub.active_count(), 1);

    // 重复取消无副作用
    first.cancel();
    assert_eq!(hub.active_count(), 1);

    drop(second);
    assert_eq!(hub.active_count(), 0);
}

#[test]
fn test_missing_path_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    let hub = WatchHub::new(DEFAULT_POLL_INTERVAL, DEFAULT_WARN_THRESHOLD).unwrap();
    let (callback, _rx) = recording_callback();

    let err = hub.activate(&missing, callback).unwrap_err();
    assert!(matches!(err, WatchError::OpenFailed { ref path, .. } if path == &missing));
    assert!(err.to_string().contains("does-not-exist"));
    assert_eq!(hub.active_count(), 0);
}

#[test]
fn test_callback_fires_for_new_entry() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let hub = WatchHub::new(DEFAULT_POLL_INTERVAL, DEFAULT_WARN_THRESHOLD).unwrap();
    let (callback, rx) = recording_callback();
    let _watcher = hub.activate(&root, callback).unwrap();

    std::fs::write(root.join("created.txt"), "x").unwrap();
    let changed = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(changed.starts_with(&root));
}

#[test]
fn test_removing_watched_path_marks_routes_lost() {
    let table = RouteTable::default();
    let (callback, rx) = recording_callback();
    let (dir_route, dir_lost) = route(1, &callback);
    let (parent_route, parent_lost) = route(2, &callback);
    table.insert(Path::new("/w/b"), dir_route);
    table.insert(Path::new("/w"), parent_route);

    // 子项删除不影响目录自身的监听
    table.dispatch(&REMOVE_DIR, &[PathBuf::from("/w/b/old")]);
    assert!(!dir_lost.load(Ordering::Acquire));
    assert_eq!(rx.try_iter().count(), 1);

    table.dispatch(&REMOVE_DIR, &[PathBuf::from("/w/b")]);
    assert!(dir_lost.load(Ordering::Acquire));
    assert!(!parent_lost.load(Ordering::Acquire));
    // 两条路由都收到通知：目录本身与其父目录
    assert_eq!(rx.try_iter().count(), 2);

    // 路由已移除，重新注册时会重新打开后端监听
    assert!(table.insert(Path::new("/w/b"), route(3, &callback).0));
}

#[test]
fn test_renaming_watched_path_marks_route_lost() {
    let table = RouteTable::default();
    let (callback, _rx) = recording_callback();
    let (dir_route, lost) = route(1, &callback);
    table.insert(Path::new("/w/b"), dir_route);

    table.dispatch(
        &EventKind::Modify(ModifyKind::Name(RenameMode::From)),
        &[PathBuf::from("/w/b")],
    );
    assert!(lost.load(Ordering::Acquire));
}

#[test]
fn test_recreated_directory_needs_new_watch() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().canonicalize().unwrap().join("b");
    std::fs::create_dir(&sub).unwrap();
    let hub = WatchHub::new(DEFAULT_POLL_INTERVAL, DEFAULT_WARN_THRESHOLD).unwrap();
    let (callback, rx) = recording_callback();
    let stale = hub.activate(&sub, Arc::clone(&callback)).unwrap();

    std::fs::remove_dir_all(&sub).unwrap();
    std::fs::create_dir(&sub).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while stale.is_active() && Instant::now() < deadline {
        let _ = rx.recv_timeout(Duration::from_millis(50));
    }
    assert!(!stale.is_active());
    assert_eq!(hub.active_count(), 1);

    let fresh = hub.activate(&sub, callback).unwrap();
    assert!(fresh.is_active());
    while rx.try_recv().is_ok() {}

    std::fs::write(sub.join("new.txt"), "x").unwrap();
    let changed = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(changed.starts_with(&sub));

    drop(stale);
    assert!(fresh.is_active());
    assert_eq!(hub.active_count(), 1);
}

#[test]
fn test_crossing_warn_threshold_is_logged() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();

    let hub = WatchHub::new(DEFAULT_POLL_INTERVAL, 1).unwrap();
    let (callback, _rx) = recording_callback();
    tracing::subscriber::with_default(subscriber, || {
        let _a = hub.activate(first.path(), Arc::clone(&callback)).unwrap();
        assert!(!log.text().contains("watcher descriptors in use"));

        let _b = hub.activate(second.path(), Arc::clone(&callback)).unwrap();
        let text = log.text();
        assert!(text.contains("watcher descriptors in use"));
        assert!(text.contains("active=2"));
    });
}
