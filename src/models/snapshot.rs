// file: src/models/snapshot.rs
// description: file entries and the tree snapshot submitted to the remote
// reference: internal data structures

use crate::models::BranchHead;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Git file mode of a tree item. Only regular, non-executable files are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileMode {
    #[serde(rename = "100644")]
    Regular,
}

impl FileMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub absolute_path: PathBuf,
    pub relative_path: String,
    pub content: String,
    pub mode: FileMode,
}

impl FileEntry {
    pub fn new(absolute_path: PathBuf, relative_path: String, content: String) -> Self {
        Self {
            absolute_path,
            relative_path,
            content,
            mode: FileMode::Regular,
        }
    }

    pub fn to_tree_item(&self) -> TreeItem {
        TreeItem {
            path: self.relative_path.clone(),
            mode: self.mode,
            kind: "blob".to_string(),
            content: self.content.clone(),
        }
    }
}

/// Wire form of one entry in a tree-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeItem {
    pub path: String,
    pub mode: FileMode,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

/// Every file of one publish, keyed to the branch head observed at its start.
///
/// Entries are kept sorted by relative path and paths are unique; construction
/// goes through [`crate::publisher::SnapshotBuilder`], which enforces both.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    pub base: Option<BranchHead>,
    pub entries: Vec<FileEntry>,
}

impl TreeSnapshot {
    pub fn base_commit_sha(&self) -> Option<&str> {
        self.base.as_ref().map(|head| head.commit_sha.as_str())
    }

    pub fn base_tree_sha(&self) -> Option<&str> {
        self.base.as_ref().map(|head| head.tree_sha.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tree_items(&self) -> Vec<TreeItem> {
        self.entries.iter().map(FileEntry::to_tree_item).collect()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.content.len() as u64).sum()
    }

    /// SHA-256 over (path, mode, content) of every entry. Depends only on local file state.
    pub fn content_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for entry in &self.entries {
            hasher.update(entry.relative_path.as_bytes());
            hasher.update([0u8]);
            hasher.update(entry.mode.as_str().as_bytes());
            hasher.update([0u8]);
            hasher.update((entry.content.len() as u64).to_be_bytes());
            hasher.update(entry.content.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, content: &str) -> FileEntry {
        FileEntry::new(
            PathBuf::from(format!("/root/{}", path)),
            path.to_string(),
            content.to_string(),
        )
    }

    #[test]
    fn test_tree_item_serialization() {
        let item = entry("sub/b.txt", "world").to_tree_item();
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["path"], "sub/b.txt");
        assert_eq!(json["mode"], "100644");
        assert_eq!(json["type"], "blob");
        assert_eq!(json["content"], "world");
    }

    #[test]
    fn test_digest_ignores_absolute_location() {
        let a = TreeSnapshot {
            base: None,
            entries: vec![entry("a.txt", "hello")],
        };
        let mut moved = entry("a.txt", "hello");
        moved.absolute_path = PathBuf::from("/elsewhere/a.txt");
        let b = TreeSnapshot {
            base: Some(BranchHead::new("c1", "t1")),
            entries: vec![moved],
        };

        assert_eq!(a.content_digest(), b.content_digest());
    }

    #[test]
    fn test_digest_separates_path_and_content() {
        let a = TreeSnapshot {
            base: None,
            entries: vec![entry("ab", "c")],
        };
        let b = TreeSnapshot {
            base: None,
            entries: vec![entry("a", "bc")],
        };

        assert_ne!(a.content_digest(), b.content_digest());
    }
}
