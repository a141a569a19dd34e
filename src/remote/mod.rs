// file: src/remote/mod.rs
// description: repository host capability and its implementations
// reference: Internal module structure

pub mod github;
pub mod memory;

use crate::error::RemoteError;
use crate::models::{BranchHead, RepositoryCoordinate, TreeItem};
use async_trait::async_trait;

pub use github::GithubClient;
pub use memory::{HostCall, InMemoryHost};

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// The Git Data operations a snapshot publish is composed of.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Head of the branch. `Ok(None)` means the repository has no commits at all.
    async fn get_branch_head(
        &self,
        coordinate: &RepositoryCoordinate,
    ) -> RemoteResult<Option<BranchHead>>;

    /// Creates a tree overlaying `items` on `base_tree`, returning the new tree SHA.
    async fn create_tree(
        &self,
        coordinate: &RepositoryCoordinate,
        base_tree: Option<&str>,
        items: &[TreeItem],
    ) -> RemoteResult<String>;

    async fn create_commit(
        &self,
        coordinate: &RepositoryCoordinate,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> RemoteResult<String>;

    /// Moves `heads/{branch}` to `commit_sha`. Must reject non-fast-forward
    /// updates with [`RemoteError::Conflict`].
    async fn update_ref(
        &self,
        coordinate: &RepositoryCoordinate,
        commit_sha: &str,
    ) -> RemoteResult<()>;

    /// Creates `refs/heads/{branch}` pointing at `commit_sha`.
    async fn create_ref(
        &self,
        coordinate: &RepositoryCoordinate,
        commit_sha: &str,
    ) -> RemoteResult<()>;
}
