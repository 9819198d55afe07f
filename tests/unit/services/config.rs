use super::*;

#[test]
fn test_defaults() {
    let config = TreeConfig::default();
    assert_eq!(config.config_dir_name, ".zcode");
    assert_eq!(config.watcher_warn_threshold, 2000);
    assert_eq!(config.poll_interval(), Duration::from_millis(250));
    assert_eq!(config.scan_depth_limit, None);
    assert!(config.ignored_names.iter().any(|n| n == ".DS_Store"));
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = TreeConfig::from_json(r#"{"scan_depth_limit": 2, "config_dir_name": ".vscode"}"#)
        .unwrap();
    assert_eq!(config.scan_depth_limit, Some(2));
    assert_eq!(config.config_dir_name, ".vscode");
    assert_eq!(config.ignored_names, TreeConfig::default().ignored_names);
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.json");
    std::fs::write(&path, r#"{"poll_interval_ms": 40, "ignored_names": []}"#).unwrap();

    let config = TreeConfig::load_from(&path).unwrap();
    assert_eq!(config.poll_interval(), Duration::from_millis(40));
    assert!(config.ignored_names.is_empty());
}

#[test]
fn test_load_from_missing_or_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(TreeConfig::load_from(&dir.path().join("absent.json")), None);

    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(TreeConfig::load_from(&path), None);
}

#[test]
fn test_serialized_default_round_trips() {
    let text = serde_json::to_string(&TreeConfig::default()).unwrap();
    assert_eq!(TreeConfig::from_json(&text).unwrap(), TreeConfig::default());
}
