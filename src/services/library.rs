use crate::models::PlayableItem;
use crate::services::mp3::is_valid_mp3;
use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Immediate children of `dir`, or nothing if it can't be read.
fn children(dir: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
}

fn entry_name(entry: &DirEntry) -> Option<String> {
    let name = entry.file_name().to_str().map(str::to_owned);
    if name.is_none() {
        debug!("Skipping non UTF-8 name: {}", entry.path().display());
    }
    name
}

/// Names of the valid MP3 files directly inside `dir`, sorted.
pub fn mp3s_in_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = children(dir)
        .filter(|entry| entry.path().is_file() && is_valid_mp3(entry.path()))
        .filter_map(|entry| entry_name(&entry))
        .collect();
    names.sort();
    names
}

/// Scan the library root one level deep for playable files and folders.
pub fn list_playable_items(root: &Path) -> Vec<PlayableItem> {
    let mut items = Vec::new();

    for entry in children(root) {
        let path = entry.path();
        let Some(name) = entry_name(&entry) else {
            continue;
        };

        if path.is_file() {
            if is_valid_mp3(path) {
                items.push(PlayableItem::file(name));
            }
        } else if path.is_dir() && !mp3s_in_dir(path).is_empty() {
            items.push(PlayableItem::folder(name));
        }
    }

    items.sort_by(|a, b| a.name.cmp(&b.name));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;
    use crate::services::mp3::sample_mp3_bytes;
    use std::fs;

    #[test]
    fn test_non_mp3_files_are_hidden() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), "hello").unwrap();
        fs::write(dir.path().join("fake.mp3"), "not audio").unwrap();

        assert!(list_playable_items(dir.path()).is_empty());
    }

    #[test]
    fn test_files_sorted_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["horn.mp3", "Applause.mp3", "airhorn.mp3"] {
            fs::write(dir.path().join(name), sample_mp3_bytes()).unwrap();
        }

        let names: Vec<String> = list_playable_items(dir.path())
            .into_iter()
            .map(|item| item.name)
            .collect();

        assert_eq!(names, vec!["Applause.mp3", "airhorn.mp3", "horn.mp3"]);
    }

    #[test]
    fn test_folders_need_one_valid_mp3() {
        let dir = tempfile::tempdir().unwrap();

        let mixed = dir.path().join("mixed");
        fs::create_dir(&mixed).unwrap();
        fs::write(mixed.join("good.mp3"), sample_mp3_bytes()).unwrap();
        fs::write(mixed.join("bad.mp3"), "junk").unwrap();
        fs::write(mixed.join("cover.jpg"), "jpeg").unwrap();

        let junk = dir.path().join("junk");
        fs::create_dir(&junk).unwrap();
        fs::write(junk.join("bad.mp3"), "junk").unwrap();

        let items = list_playable_items(dir.path());
        assert_eq!(items, vec![PlayableItem::folder("mixed")]);
        assert_eq!(items[0].kind, ItemKind::Folder);
    }

    #[test]
    fn test_nested_folders_not_scanned() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("outer").join("inner");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("song.mp3"), sample_mp3_bytes()).unwrap();

        assert!(list_playable_items(dir.path()).is_empty());
        assert!(mp3s_in_dir(&dir.path().join("outer")).is_empty());
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert!(list_playable_items(&missing).is_empty());
        assert!(mp3s_in_dir(&missing).is_empty());
    }

    #[test]
    fn test_mixed_listing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ding.mp3"), sample_mp3_bytes()).unwrap();
        let folder = dir.path().join("cheers");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("one.mp3"), sample_mp3_bytes()).unwrap();
        fs::write(folder.join("two.mp3"), sample_mp3_bytes()).unwrap();

        assert_eq!(
            list_playable_items(dir.path()),
            vec![PlayableItem::folder("cheers"), PlayableItem::file("ding.mp3")]
        );
        assert_eq!(mp3s_in_dir(&folder), vec!["one.mp3", "two.mp3"]);
    }
}
