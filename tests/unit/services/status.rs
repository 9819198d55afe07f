use super::*;

#[test]
fn test_from_statuses_keeps_primary_tags() {
    let table = StatusTable::from_statuses([
        (
            PathBuf::from("/r/a.rs"),
            GitFileStatus {
                index: Some(ChangeTag::Added),
                worktree: Some(ChangeTag::Modified),
            },
        ),
        (PathBuf::from("/r/clean.rs"), GitFileStatus::default()),
        (
            PathBuf::from("/r/new.txt"),
            GitFileStatus {
                index: None,
                worktree: Some(ChangeTag::Untracked),
            },
        ),
    ]);

    assert_eq!(table.len(), 2);
    assert_eq!(table.change_tag(Path::new("/r/a.rs")), Some(ChangeTag::Added));
    assert_eq!(table.change_tag(Path::new("/r/new.txt")), Some(ChangeTag::Untracked));
    assert_eq!(table.change_tag(Path::new("/r/clean.rs")), None);
}

#[test]
fn test_replace_discards_previous_entries() {
    let mut table = StatusTable::new();
    table.insert(PathBuf::from("/r/old.rs"), ChangeTag::Deleted);
    assert!(!table.is_empty());

    table.replace(std::iter::empty());
    assert!(table.is_empty());
    assert_eq!(table.iter().count(), 0);
    assert_eq!(table.change_tag(Path::new("/r/old.rs")), None);
}
