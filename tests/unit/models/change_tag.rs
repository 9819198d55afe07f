use super::*;

#[test]
fn test_marker_round_trip() {
    for tag in [
        ChangeTag::Modified,
        ChangeTag::Added,
        ChangeTag::Deleted,
        ChangeTag::Renamed,
        ChangeTag::Untracked,
        ChangeTag::Conflict,
    ] {
        assert_eq!(ChangeTag::from_marker(tag.marker()), Some(tag));
        assert_eq!(tag.to_string(), tag.marker().to_string());
    }
    assert_eq!(ChangeTag::from_marker('x'), None);
}

#[test]
fn test_primary_tag_prefers_conflict_and_untracked() {
    let status = GitFileStatus {
        index: Some(ChangeTag::Modified),
        worktree: Some(ChangeTag::Conflict),
    };
    assert_eq!(status.primary_tag(), Some(ChangeTag::Conflict));

    let status = GitFileStatus {
        index: None,
        worktree: Some(ChangeTag::Untracked),
    };
    assert_eq!(status.primary_tag(), Some(ChangeTag::Untracked));
}

#[test]
fn test_primary_tag_staged_over_worktree_modification() {
    let status = GitFileStatus {
        index: Some(ChangeTag::Added),
        worktree: Some(ChangeTag::Modified),
    };
    assert_eq!(status.primary_tag(), Some(ChangeTag::Added));
    assert_eq!(GitFileStatus::default().primary_tag(), None);
}

#[test]
fn test_no_change_tags_provider() {
    assert_eq!(NoChangeTags.change_tag(Path::new("/any/file.rs")), None);
}

#[test]
fn test_serde_uses_variant_names() {
    let json = serde_json::to_string(&ChangeTag::Renamed).unwrap();
    assert_eq!(json, "\"Renamed\"");
    let back: ChangeTag = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ChangeTag::Renamed);
}
