// file: src/remote/memory.rs
// description: deterministic in-process repository host with a call log
// reference: Git object model (content-addressed trees, parent-linked commits)

use crate::error::RemoteError;
use crate::models::{BranchHead, RepositoryCoordinate, TreeItem};
use crate::remote::{RemoteResult, RepositoryHost};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCall {
    GetBranchHead,
    CreateTree,
    CreateCommit,
    UpdateRef,
    CreateRef,
}

#[derive(Debug, Clone)]
struct StoredCommit {
    tree: String,
    parents: Vec<String>,
    message: String,
}

#[derive(Debug, Default)]
struct HostState {
    branches: HashMap<String, String>,
    trees: HashMap<String, BTreeMap<String, String>>,
    commits: HashMap<String, StoredCommit>,
    calls: Vec<HostCall>,
    sequence: u64,
    scripted_failures: HashMap<HostCall, RemoteError>,
    race_on_commit: Option<String>,
    last_tree_items: Vec<TreeItem>,
}

/// Repository host kept entirely in memory.
///
/// Trees are content addressed, so identical file sets share a SHA, while every
/// commit gets a fresh SHA. Reference updates are fast-forward only.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    state: Mutex<HostState>,
}

impl InMemoryHost {
    /// A repository without any commit; every branch is unborn.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A repository whose `branch` holds one commit with the given files.
    pub fn with_branch(branch: &str, files: &[(&str, &str)]) -> Self {
        let host = Self::default();
        {
            let mut state = host.state();
            let tree: BTreeMap<String, String> = files
                .iter()
                .map(|(path, content)| (path.to_string(), content.to_string()))
                .collect();
            let tree_sha = state.store_tree(tree);
            let commit_sha = state.store_commit(tree_sha, Vec::new(), "initial commit");
            state.branches.insert(branch.to_string(), commit_sha);
        }
        host
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, call: HostCall) -> usize {
        self.state().calls.iter().filter(|c| **c == call).count()
    }

    pub fn reset_calls(&self) {
        self.state().calls.clear();
    }

    /// Makes the next `call` fail with `error`.
    pub fn fail_next(&self, call: HostCall, error: RemoteError) {
        self.state().scripted_failures.insert(call, error);
    }

    /// On the next commit creation, someone else pushes to `branch` first.
    pub fn race_next_commit(&self, branch: &str) {
        self.state().race_on_commit = Some(branch.to_string());
    }

    pub fn branch_head(&self, branch: &str) -> Option<String> {
        self.state().branches.get(branch).cloned()
    }

    pub fn commit_tree(&self, commit_sha: &str) -> Option<String> {
        self.state().commits.get(commit_sha).map(|c| c.tree.clone())
    }

    pub fn commit_parents(&self, commit_sha: &str) -> Option<Vec<String>> {
        self.state().commits.get(commit_sha).map(|c| c.parents.clone())
    }

    pub fn commit_message(&self, commit_sha: &str) -> Option<String> {
        self.state().commits.get(commit_sha).map(|c| c.message.clone())
    }

    /// Files of the tree a commit points at, path to content.
    pub fn files_at(&self, commit_sha: &str) -> Option<BTreeMap<String, String>> {
        let state = self.state();
        let commit = state.commits.get(commit_sha)?;
        state.trees.get(&commit.tree).cloned()
    }

    /// Items of the most recent tree-creation request.
    pub fn last_tree_items(&self) -> Vec<TreeItem> {
        self.state().last_tree_items.clone()
    }

    fn begin(&self, call: HostCall) -> RemoteResult<MutexGuard<'_, HostState>> {
        let mut state = self.state();
        state.calls.push(call);
        let failure = state.scripted_failures.remove(&call);
        match failure {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

impl HostState {
    fn store_tree(&mut self, files: BTreeMap<String, String>) -> String {
        let mut hasher = Sha256::new();
        for (path, content) in &files {
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update((content.len() as u64).to_be_bytes());
            hasher.update(content.as_bytes());
        }
        let sha = object_id(hasher);
        self.trees.insert(sha.clone(), files);
        sha
    }

    fn store_commit(&mut self, tree: String, parents: Vec<String>, message: &str) -> String {
        self.sequence += 1;

        let mut hasher = Sha256::new();
        hasher.update(tree.as_bytes());
        for parent in &parents {
            hasher.update(parent.as_bytes());
        }
        hasher.update(message.as_bytes());
        hasher.update(self.sequence.to_be_bytes());
        let sha = object_id(hasher);

        self.commits.insert(
            sha.clone(),
            StoredCommit {
                tree,
                parents,
                message: message.to_string(),
            },
        );
        sha
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        let mut pending = vec![descendant.to_string()];
        while let Some(sha) = pending.pop() {
            if sha == ancestor {
                return true;
            }
            if let Some(commit) = self.commits.get(&sha) {
                pending.extend(commit.parents.iter().cloned());
            }
        }
        false
    }

    fn head_of(&self, branch: &str) -> Option<BranchHead> {
        let commit_sha = self.branches.get(branch)?;
        let commit = self.commits.get(commit_sha)?;
        Some(BranchHead::new(commit_sha.clone(), commit.tree.clone()))
    }
}

fn object_id(hasher: Sha256) -> String {
    let digest = format!("{:x}", hasher.finalize());
    digest[..40].to_string()
}

#[async_trait]
impl RepositoryHost for InMemoryHost {
    async fn get_branch_head(
        &self,
        coordinate: &RepositoryCoordinate,
    ) -> RemoteResult<Option<BranchHead>> {
        let state = self.begin(HostCall::GetBranchHead)?;

        if state.commits.is_empty() {
            return Ok(None);
        }

        state
            .head_of(&coordinate.branch)
            .map(Some)
            .ok_or_else(|| RemoteError::NotFound("Branch not found".to_string()))
    }

    async fn create_tree(
        &self,
        _coordinate: &RepositoryCoordinate,
        base_tree: Option<&str>,
        items: &[TreeItem],
    ) -> RemoteResult<String> {
        let mut state = self.begin(HostCall::CreateTree)?;

        let mut files = match base_tree {
            Some(sha) => state.trees.get(sha).cloned().ok_or_else(|| RemoteError::Status {
                status: 422,
                message: format!("Invalid base_tree: {}", sha),
            })?,
            None => BTreeMap::new(),
        };

        for item in items {
            files.insert(item.path.clone(), item.content.clone());
        }

        state.last_tree_items = items.to_vec();
        Ok(state.store_tree(files))
    }

    async fn create_commit(
        &self,
        _coordinate: &RepositoryCoordinate,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> RemoteResult<String> {
        let mut state = self.begin(HostCall::CreateCommit)?;

        if !state.trees.contains_key(tree_sha) {
            return Err(RemoteError::Status {
                status: 422,
                message: format!("Tree SHA does not exist: {}", tree_sha),
            });
        }
        if let Some(missing) = parents.iter().find(|p| !state.commits.contains_key(*p)) {
            return Err(RemoteError::Status {
                status: 422,
                message: format!("Parent SHA does not exist: {}", missing),
            });
        }

        if let Some(branch) = state.race_on_commit.take()
            && let Some(head) = state.head_of(&branch)
        {
            let foreign = state.store_commit(head.tree_sha, vec![head.commit_sha], "concurrent push");
            state.branches.insert(branch, foreign);
        }

        Ok(state.store_commit(tree_sha.to_string(), parents.to_vec(), message))
    }

    async fn update_ref(
        &self,
        coordinate: &RepositoryCoordinate,
        commit_sha: &str,
    ) -> RemoteResult<()> {
        let mut state = self.begin(HostCall::UpdateRef)?;

        let current = state
            .branches
            .get(&coordinate.branch)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound("Reference does not exist".to_string()))?;

        if !state.commits.contains_key(commit_sha) {
            return Err(RemoteError::Status {
                status: 422,
                message: "Object does not exist".to_string(),
            });
        }
        if !state.is_ancestor(&current, commit_sha) {
            return Err(RemoteError::Conflict(
                "Update is not a fast forward".to_string(),
            ));
        }

        state
            .branches
            .insert(coordinate.branch.clone(), commit_sha.to_string());
        Ok(())
    }

    async fn create_ref(
        &self,
        coordinate: &RepositoryCoordinate,
        commit_sha: &str,
    ) -> RemoteResult<()> {
        let mut state = self.begin(HostCall::CreateRef)?;

        if state.branches.contains_key(&coordinate.branch) {
            return Err(RemoteError::Conflict("Reference already exists".to_string()));
        }
        if !state.commits.contains_key(commit_sha) {
            return Err(RemoteError::Status {
                status: 422,
                message: "Object does not exist".to_string(),
            });
        }

        state
            .branches
            .insert(coordinate.branch.clone(), commit_sha.to_string());
        Ok(())
    }
}
