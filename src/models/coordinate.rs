// file: src/models/coordinate.rs
// description: remote repository coordinate and branch head models
// reference: internal data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the remote branch a snapshot is published to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryCoordinate {
    pub owner: String,
    pub repository: String,
    pub branch: String,
}

impl RepositoryCoordinate {
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            branch: branch.into(),
        }
    }

    /// Reference name as the Git Data API expects it, e.g. `heads/main`.
    pub fn ref_name(&self) -> String {
        format!("heads/{}", self.branch)
    }

    /// Fully qualified reference, e.g. `refs/heads/main`.
    pub fn full_ref_name(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }
}

impl fmt::Display for RepositoryCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repository, self.branch)
    }
}

/// Commit currently referenced by a branch, with the root tree of that commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchHead {
    pub commit_sha: String,
    pub tree_sha: String,
}

impl BranchHead {
    pub fn new(commit_sha: impl Into<String>, tree_sha: impl Into<String>) -> Self {
        Self {
            commit_sha: commit_sha.into(),
            tree_sha: tree_sha.into(),
        }
    }
}
