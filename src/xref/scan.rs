//! Discovery of cross-reference documents beneath a documentation output
//! root.
//!
//! The documentation tool writes each scanned directory's output into its own
//! subtree, so a single output root can hold many cross-reference documents.
//! Discovery returns the directories containing them, which are then fed to
//! the linkage parser one pass at a time.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::xref::parser::LINK_DOCUMENT;

/// Finds every directory beneath `root` (inclusive) that contains a
/// cross-reference document.
///
/// Results are sorted for deterministic pass ordering. Unreadable directory
/// entries are skipped.
#[must_use]
pub fn link_directories(root: &Path) -> Vec<PathBuf> {
    let mut directories: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == LINK_DOCUMENT)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect();

    directories.sort();
    directories.dedup();
    directories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_link_documents() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a/xml");
        let second = dir.path().join("b/xml");
        std::fs::create_dir_all(&first).unwrap();
        std::fs::create_dir_all(&second).unwrap();
        std::fs::write(first.join(LINK_DOCUMENT), "<root/>").unwrap();
        std::fs::write(second.join(LINK_DOCUMENT), "<root/>").unwrap();

        let directories = link_directories(dir.path());

        assert_eq!(directories, vec![first, second]);
    }

    #[test]
    fn root_itself_may_hold_the_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LINK_DOCUMENT), "<root/>").unwrap();

        let directories = link_directories(dir.path());

        assert_eq!(directories, vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("other.xml"), "<root/>").unwrap();

        assert!(link_directories(dir.path()).is_empty());
    }
}
