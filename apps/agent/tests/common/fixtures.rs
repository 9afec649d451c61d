//! Test fixtures for vault contents.

#![allow(dead_code)]

use std::path::Path;

/// Generate sample MD content with a specified number of question cards.
pub fn sample_md_content(num_cards: usize) -> String {
    (0..num_cards)
        .map(|i| format!("Q: Question {}?\nA: Answer {}.\n", i + 1, i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `content` to `relative` below `root`, creating folders.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

pub fn read_file(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative)).unwrap()
}

/// Origin-ids of the marker lines in a document.
pub fn markers(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(anki_sync_core::parser::parse_marker)
        .map(str::to_string)
        .collect()
}
