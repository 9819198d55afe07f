use super::*;

#[test]
fn test_folder_states_have_distinct_symbols() {
    let table = PlainIconTable;
    let symbols = [
        table.symbol(NodeIcon::RootFolder),
        table.symbol(NodeIcon::ConfigFolder),
        table.symbol(NodeIcon::FolderFilled),
        table.symbol(NodeIcon::FolderEmpty),
        table.symbol(NodeIcon::Unknown),
    ];
    for (i, a) in symbols.iter().enumerate() {
        for b in &symbols[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_file_symbols_follow_type() {
    let table = PlainIconTable;
    assert_eq!(table.symbol(NodeIcon::File(FileType::Png)), "[img]");
    assert_eq!(table.symbol(NodeIcon::File(FileType::Lock)), "[lck]");
    assert_eq!(
        table.symbol(NodeIcon::File(FileType::Rs)),
        table.symbol(NodeIcon::File(FileType::Md))
    );
}

#[test]
fn test_accent_colors() {
    let table = PlainIconTable;
    assert_eq!(table.accent_color(FileType::Rs), Some(Rgb(222, 165, 132)));
    assert_eq!(table.accent_color(FileType::Txt), None);
}
