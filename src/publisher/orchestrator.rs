// file: src/publisher/orchestrator.rs
// description: snapshot publish orchestration: head, walk, tree, commit, ref
// reference: https://docs.github.com/en/rest/git

use crate::error::{PublishError, Result};
use crate::models::{BranchHead, PublishReceipt, RepositoryCoordinate, SyncResult};
use crate::publisher::snapshot::SnapshotBuilder;
use crate::remote::RepositoryHost;
use crate::repository::DirectoryWalker;
use crate::utils::OperationTimer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Publishes a local folder to a remote branch as one commit.
///
/// Steps run strictly in order and each aborts the rest on failure. Objects
/// created before a failed reference update are left unreferenced on the
/// remote; the branch only moves in the final request.
pub struct SnapshotPublisher {
    host: Arc<dyn RepositoryHost>,
    walker: DirectoryWalker,
    builder: SnapshotBuilder,
}

impl SnapshotPublisher {
    pub fn new(host: Arc<dyn RepositoryHost>, builder: SnapshotBuilder) -> Self {
        Self {
            host,
            walker: DirectoryWalker::new(),
            builder,
        }
    }

    pub async fn resolve_head(
        &self,
        coordinate: &RepositoryCoordinate,
    ) -> Result<Option<BranchHead>> {
        self.host
            .get_branch_head(coordinate)
            .await
            .map_err(|source| PublishError::HeadResolution {
                branch: coordinate.branch.clone(),
                source,
            })
    }

    /// Runs a publish and folds the outcome into a [`SyncResult`]. Never fails.
    pub async fn publish(
        &self,
        coordinate: &RepositoryCoordinate,
        root: &Path,
        message: &str,
    ) -> SyncResult {
        let result = self.try_publish(coordinate, root, message).await;
        Self::fold(coordinate, result)
    }

    /// Like [`publish`](Self::publish), for an explicit file list instead of
    /// the whole folder.
    pub async fn publish_files(
        &self,
        coordinate: &RepositoryCoordinate,
        root: &Path,
        files: &[PathBuf],
        message: &str,
    ) -> SyncResult {
        let result = self.try_publish_files(coordinate, root, files, message).await;
        Self::fold(coordinate, result)
    }

    pub async fn try_publish(
        &self,
        coordinate: &RepositoryCoordinate,
        root: &Path,
        message: &str,
    ) -> Result<PublishReceipt> {
        let timer = OperationTimer::new(&format!("publish {}", coordinate));
        let base = self.resolve_base(coordinate).await?;

        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let files = self.walker.walk(&root);

        self.commit_files(coordinate, base, &root, &files, message, timer)
            .await
    }

    /// Publishes only `files`. Relative entries are taken relative to `root`,
    /// and every entry must still map to a path inside `root`.
    pub async fn try_publish_files(
        &self,
        coordinate: &RepositoryCoordinate,
        root: &Path,
        files: &[PathBuf],
        message: &str,
    ) -> Result<PublishReceipt> {
        let timer = OperationTimer::new(&format!("publish {} selected files", coordinate));
        let base = self.resolve_base(coordinate).await?;

        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let files: Vec<PathBuf> = files
            .iter()
            .map(|file| {
                let joined = root.join(file);
                std::path::absolute(&joined).unwrap_or(joined)
            })
            .collect();

        self.commit_files(coordinate, base, &root, &files, message, timer)
            .await
    }

    fn fold(coordinate: &RepositoryCoordinate, result: Result<PublishReceipt>) -> SyncResult {
        if let Err(e) = &result {
            if e.is_conflict() {
                warn!("{} moved during publish; re-run to retry: {}", coordinate, e);
            } else {
                error!("Publish to {} failed: {}", coordinate, e);
            }
        }
        SyncResult::from(result)
    }

    async fn resolve_base(&self, coordinate: &RepositoryCoordinate) -> Result<Option<BranchHead>> {
        let base = self.resolve_head(coordinate).await?;
        match &base {
            Some(head) => info!("Branch {} is at {}", coordinate.branch, head.commit_sha),
            None => info!("Branch {} has no commits yet", coordinate.branch),
        }
        Ok(base)
    }

    async fn commit_files(
        &self,
        coordinate: &RepositoryCoordinate,
        base: Option<BranchHead>,
        root: &Path,
        files: &[PathBuf],
        message: &str,
        timer: OperationTimer,
    ) -> Result<PublishReceipt> {
        if files.is_empty() {
            return Err(PublishError::NothingToPublish {
                root: root.to_path_buf(),
            });
        }
        timer.checkpoint(&format!("enumerated {} files", files.len()));

        let snapshot = self.builder.build(base, root, files).await?;
        let digest = snapshot.content_digest();
        timer.checkpoint(&format!(
            "read {} files ({} bytes, digest {})",
            snapshot.len(),
            snapshot.total_bytes(),
            &digest[..12]
        ));

        let tree_sha = self
            .host
            .create_tree(coordinate, snapshot.base_tree_sha(), &snapshot.tree_items())
            .await
            .map_err(PublishError::RemoteTree)?;
        info!("Created tree {}", tree_sha);

        let parents: Vec<String> = snapshot
            .base_commit_sha()
            .map(str::to_string)
            .into_iter()
            .collect();
        let commit_sha = self
            .host
            .create_commit(coordinate, message, &tree_sha, &parents)
            .await
            .map_err(PublishError::RemoteCommit)?;
        info!("Created commit {}", commit_sha);

        let reference = coordinate.ref_name();
        let moved = match snapshot.base {
            Some(_) => self.host.update_ref(coordinate, &commit_sha).await,
            None => self.host.create_ref(coordinate, &commit_sha).await,
        };
        moved.map_err(|source| PublishError::RemoteRefUpdate {
            reference: reference.clone(),
            source,
        })?;
        info!("Moved {} to {}", reference, commit_sha);

        timer.finish_with_count(snapshot.len());

        Ok(PublishReceipt {
            base_commit_sha: snapshot.base_commit_sha().map(str::to_string),
            tree_sha,
            commit_sha,
            files_published: snapshot.len(),
            content_digest: digest,
        })
    }
}
