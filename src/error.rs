// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use crate::models::PublishStep;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PublishError>;

/// Failure reported by a repository host, classified by what the caller can do about it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected as conflicting: {0}")]
    Conflict(String),

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::Conflict(_))
    }
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to resolve head of branch '{branch}': {source}")]
    HeadResolution {
        branch: String,
        source: RemoteError,
    },

    #[error("Cannot traverse {path}: {source}")]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Nothing to publish: {root} contains no files")]
    NothingToPublish { root: PathBuf },

    #[error("Cannot map {path} into the repository: {reason}")]
    PathNormalization { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create tree: {0}")]
    RemoteTree(RemoteError),

    #[error("Failed to create commit: {0}")]
    RemoteCommit(RemoteError),

    #[error("Failed to update reference '{reference}': {source}")]
    RemoteRefUpdate {
        reference: String,
        source: RemoteError,
    },
}

impl PublishError {
    /// The publish step this failure aborted.
    pub fn step(&self) -> PublishStep {
        match self {
            PublishError::Config(_) => PublishStep::Configure,
            PublishError::HeadResolution { .. } => PublishStep::ResolveHead,
            PublishError::Filesystem { .. } | PublishError::NothingToPublish { .. } => {
                PublishStep::Enumerate
            }
            PublishError::PathNormalization { .. } => PublishStep::NormalizePaths,
            PublishError::FileRead { .. } => PublishStep::ReadContent,
            PublishError::RemoteTree(_) => PublishStep::CreateTree,
            PublishError::RemoteCommit(_) => PublishStep::CreateCommit,
            PublishError::RemoteRefUpdate { .. } => PublishStep::UpdateReference,
        }
    }

    /// True when the branch moved underneath us; re-running the whole publish may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, PublishError::RemoteRefUpdate { source, .. } if source.is_conflict())
    }
}
