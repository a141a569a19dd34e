// file: src/publisher/snapshot.rs
// description: path normalization and concurrent content reads into a tree snapshot
// reference: https://docs.rs/futures/latest/futures/stream/trait.StreamExt.html#method.buffered

use crate::error::{PublishError, Result};
use crate::models::{BranchHead, FileEntry, TreeSnapshot};
use crate::publisher::progress::ReadProgress;
use crate::repository::relative_repo_path;
use crate::utils::{OperationTimer, PerformanceMetrics};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file that has a repository path but no content yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub absolute_path: PathBuf,
    pub relative_path: String,
}

pub struct SnapshotBuilder {
    read_concurrency: usize,
    show_progress: bool,
}

impl SnapshotBuilder {
    pub fn new(read_concurrency: usize) -> Self {
        Self {
            read_concurrency: read_concurrency.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Maps every file under `root` to its repository path, sorted by that path.
    pub fn normalize(&self, root: &Path, files: &[PathBuf]) -> Result<Vec<PendingFile>> {
        let mut pending = files
            .iter()
            .map(|file| {
                Ok(PendingFile {
                    absolute_path: file.clone(),
                    relative_path: relative_repo_path(root, file)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        pending.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        if let Some(pair) = pending
            .windows(2)
            .find(|pair| pair[0].relative_path == pair[1].relative_path)
        {
            return Err(PublishError::PathNormalization {
                path: pair[1].absolute_path.clone(),
                reason: format!("duplicate repository path '{}'", pair[1].relative_path),
            });
        }

        Ok(pending)
    }

    /// Reads every file as UTF-8 text. Order is preserved; the first failure aborts.
    pub async fn read_entries(&self, pending: Vec<PendingFile>) -> Result<Vec<FileEntry>> {
        let timer = OperationTimer::new("read content");
        let progress = ReadProgress::new(pending.len(), self.show_progress);

        let result = stream::iter(pending)
            .map(|file| {
                let progress = progress.clone();
                async move {
                    match tokio::fs::read_to_string(&file.absolute_path).await {
                        Ok(content) => {
                            debug!("Read {} ({} bytes)", file.relative_path, content.len());
                            progress.record(&file.relative_path, content.len() as u64);
                            Ok(FileEntry::new(
                                file.absolute_path,
                                file.relative_path,
                                content,
                            ))
                        }
                        Err(source) => Err(PublishError::FileRead {
                            path: file.absolute_path,
                            source,
                        }),
                    }
                }
            })
            .buffered(self.read_concurrency)
            .try_collect::<Vec<_>>()
            .await;

        progress.finish();
        let metrics = PerformanceMetrics::new("read content", progress.files_read(), timer.finish());
        debug!("{} ({} bytes)", metrics.format(), progress.bytes_read());

        result
    }

    /// Steps 3 and 4 of a publish: normalize then read.
    pub async fn build(
        &self,
        base: Option<BranchHead>,
        root: &Path,
        files: &[PathBuf],
    ) -> Result<TreeSnapshot> {
        let pending = self.normalize(root, files)?;
        let entries = self.read_entries(pending).await?;
        Ok(TreeSnapshot { base, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DirectoryWalker;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sub/deeper")).unwrap();
        fs::write(temp.path().join("a.txt"), "hello").unwrap();
        fs::write(temp.path().join("sub/b.txt"), "world").unwrap();
        fs::write(temp.path().join("sub/deeper/c.md"), "# c").unwrap();
        fs::write(temp.path().join("a-b.txt"), "dash").unwrap();
        temp
    }

    #[tokio::test]
    async fn test_relative_paths_match_manual_strip() {
        let temp = fixture();
        let root = std::path::absolute(temp.path()).unwrap();
        let files = DirectoryWalker::new().walk(&root);

        let snapshot = SnapshotBuilder::new(4).build(None, &root, &files).await.unwrap();
        let paths: Vec<&str> = snapshot
            .entries
            .iter()
            .map(|e| e.relative_path.as_str())
            .collect();

        let mut expected: Vec<String> = files
            .iter()
            .map(|f| {
                f.strip_prefix(&root)
                    .unwrap()
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect();
        expected.sort();

        assert_eq!(paths, expected);
        assert_eq!(paths, vec!["a-b.txt", "a.txt", "sub/b.txt", "sub/deeper/c.md"]);
    }

    #[tokio::test]
    async fn test_contents_follow_their_paths() {
        let temp = fixture();
        let root = std::path::absolute(temp.path()).unwrap();
        let files = DirectoryWalker::new().walk(&root);

        // concurrency of 1 and of many must give the same snapshot
        let serial = SnapshotBuilder::new(1).build(None, &root, &files).await.unwrap();
        let parallel = SnapshotBuilder::new(16).build(None, &root, &files).await.unwrap();

        assert_eq!(serial.entries, parallel.entries);
        assert_eq!(serial.content_digest(), parallel.content_digest());
        let b = serial
            .entries
            .iter()
            .find(|e| e.relative_path == "sub/b.txt")
            .unwrap();
        assert_eq!(b.content, "world");
    }

    #[test]
    fn test_duplicate_paths_are_rejected() {
        let root = Path::new("/data/site");
        let files = vec![root.join("a.txt"), root.join("./a.txt")];

        let err = SnapshotBuilder::new(1).normalize(root, &files).unwrap_err();
        assert!(matches!(err, PublishError::PathNormalization { .. }));
    }

    #[test]
    fn test_foreign_path_is_rejected() {
        let err = SnapshotBuilder::new(1)
            .normalize(Path::new("/data/site"), &[PathBuf::from("/etc/passwd")])
            .unwrap_err();
        assert!(matches!(err, PublishError::PathNormalization { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_file_aborts() {
        let temp = fixture();
        let root = std::path::absolute(temp.path()).unwrap();
        let mut files = DirectoryWalker::new().walk(&root);
        files.push(root.join("vanished.txt"));

        let err = SnapshotBuilder::new(4)
            .build(None, &root, &files)
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::FileRead { .. }));
    }

    #[tokio::test]
    async fn test_non_utf8_content_is_a_read_error() {
        let temp = TempDir::new().unwrap();
        let root = std::path::absolute(temp.path()).unwrap();
        fs::write(root.join("blob.bin"), [0xffu8, 0xfe, 0x00]).unwrap();

        let files = DirectoryWalker::new().walk(&root);
        let err = SnapshotBuilder::new(2)
            .build(None, &root, &files)
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::FileRead { .. }));
    }
}
