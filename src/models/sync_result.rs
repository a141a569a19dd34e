// file: src/models/sync_result.rs
// description: terminal outcome of one snapshot publish
// reference: internal data structures

use crate::error::PublishError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStep {
    Configure,
    ResolveHead,
    Enumerate,
    NormalizePaths,
    ReadContent,
    CreateTree,
    CreateCommit,
    UpdateReference,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStep::Configure => "configure",
            PublishStep::ResolveHead => "resolve head",
            PublishStep::Enumerate => "enumerate files",
            PublishStep::NormalizePaths => "normalize paths",
            PublishStep::ReadContent => "read content",
            PublishStep::CreateTree => "create tree",
            PublishStep::CreateCommit => "create commit",
            PublishStep::UpdateReference => "update reference",
        };
        f.write_str(name)
    }
}

/// What a successful publish produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub base_commit_sha: Option<String>,
    pub tree_sha: String,
    pub commit_sha: String,
    pub files_published: usize,
    pub content_digest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
    pub new_commit_sha: Option<String>,
    pub tree_sha: Option<String>,
    pub base_commit_sha: Option<String>,
    pub files_published: usize,
    pub failed_step: Option<PublishStep>,
    pub retryable: bool,
    pub completed_at: DateTime<Utc>,
}

impl SyncResult {
    pub fn published(receipt: PublishReceipt) -> Self {
        Self {
            success: true,
            message: format!(
                "Published {} file(s) as commit {}",
                receipt.files_published, receipt.commit_sha
            ),
            new_commit_sha: Some(receipt.commit_sha),
            tree_sha: Some(receipt.tree_sha),
            base_commit_sha: receipt.base_commit_sha,
            files_published: receipt.files_published,
            failed_step: None,
            retryable: false,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(error: &PublishError) -> Self {
        let step = error.step();
        Self {
            success: false,
            message: format!("Publish failed at step '{}': {}", step, error),
            new_commit_sha: None,
            tree_sha: None,
            base_commit_sha: None,
            files_published: 0,
            failed_step: Some(step),
            retryable: error.is_conflict(),
            completed_at: Utc::now(),
        }
    }
}

impl From<Result<PublishReceipt, PublishError>> for SyncResult {
    fn from(result: Result<PublishReceipt, PublishError>) -> Self {
        match result {
            Ok(receipt) => SyncResult::published(receipt),
            Err(error) => SyncResult::failed(&error),
        }
    }
}
