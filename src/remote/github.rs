// file: src/remote/github.rs
// description: GitHub Git Data API client backing the repository host seam
// reference: https://docs.github.com/en/rest/git

use crate::config::GithubConfig;
use crate::error::{PublishError, RemoteError, Result};
use crate::models::{BranchHead, RepositoryCoordinate, TreeItem};
use crate::remote::{RemoteResult, RepositoryHost};
use crate::utils::Validator;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Serialize)]
struct CreateTreeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    base_tree: Option<&'a str>,
    tree: &'a [TreeItem],
}

#[derive(Debug, Serialize)]
struct CreateCommitRequest<'a> {
    message: &'a str,
    tree: &'a str,
    parents: &'a [String],
}

#[derive(Debug, Serialize)]
struct UpdateRefRequest<'a> {
    sha: &'a str,
    force: bool,
}

#[derive(Debug, Serialize)]
struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    reference: String,
    sha: &'a str,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    tree: ObjectRef,
}

#[derive(Debug, Deserialize)]
struct ObjectRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub struct GithubClient {
    client: Client,
    api_url: Url,
    token: String,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PublishError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let api_url = Url::parse(&config.api_url)
            .map_err(|e| PublishError::Config(format!("Invalid api_url {}: {}", config.api_url, e)))?;
        if api_url.cannot_be_a_base() {
            return Err(PublishError::Config(format!(
                "api_url cannot carry a path: {}",
                config.api_url
            )));
        }

        Ok(Self {
            client,
            api_url,
            token: config.token.clone(),
        })
    }

    /// Every segment is percent-encoded on its own, so a branch named
    /// `fix#12` stays one path segment instead of turning into a fragment.
    fn repo_url<'a>(
        &self,
        coordinate: &RepositoryCoordinate,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend([
                    "repos",
                    coordinate.owner.as_str(),
                    coordinate.repository.as_str(),
                ])
                .extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, builder: RequestBuilder) -> RemoteResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        debug!("GitHub API responded {} for {}", status, response.url());

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> RemoteResult<T> {
        self.send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// An empty repository answers ref listings with 409 instead of an empty list.
    async fn repository_is_empty(&self, coordinate: &RepositoryCoordinate) -> RemoteResult<bool> {
        let url = self.repo_url(coordinate, ["git", "refs", "heads"]);
        match self.send(self.request(Method::GET, url)).await {
            Ok(_) => Ok(false),
            Err(RemoteError::Status { status: 409, .. }) => Ok(true),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl RepositoryHost for GithubClient {
    async fn get_branch_head(
        &self,
        coordinate: &RepositoryCoordinate,
    ) -> RemoteResult<Option<BranchHead>> {
        let branch_segments = coordinate.branch.split('/');
        let url = self.repo_url(coordinate, std::iter::once("branches").chain(branch_segments));

        match self
            .send_json::<BranchResponse>(self.request(Method::GET, url))
            .await
        {
            Ok(branch) => {
                let head = BranchHead::new(
                    expect_sha(branch.commit.sha)?,
                    expect_sha(branch.commit.commit.tree.sha)?,
                );
                Ok(Some(head))
            }
            Err(RemoteError::NotFound(message)) => {
                if self.repository_is_empty(coordinate).await? {
                    warn!("Repository {} has no commits yet", coordinate);
                    Ok(None)
                } else {
                    Err(RemoteError::NotFound(message))
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn create_tree(
        &self,
        coordinate: &RepositoryCoordinate,
        base_tree: Option<&str>,
        items: &[TreeItem],
    ) -> RemoteResult<String> {
        let url = self.repo_url(coordinate, ["git", "trees"]);
        let body = CreateTreeRequest {
            base_tree,
            tree: items,
        };

        let created: ObjectRef = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;
        expect_sha(created.sha)
    }

    async fn create_commit(
        &self,
        coordinate: &RepositoryCoordinate,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> RemoteResult<String> {
        let url = self.repo_url(coordinate, ["git", "commits"]);
        let body = CreateCommitRequest {
            message,
            tree: tree_sha,
            parents,
        };

        let created: ObjectRef = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;
        expect_sha(created.sha)
    }

    async fn update_ref(
        &self,
        coordinate: &RepositoryCoordinate,
        commit_sha: &str,
    ) -> RemoteResult<()> {
        let branch_segments = coordinate.branch.split('/');
        let url = self.repo_url(coordinate, ["git", "refs", "heads"].into_iter().chain(branch_segments));
        let body = UpdateRefRequest {
            sha: commit_sha,
            force: false,
        };

        self.send(self.request(Method::PATCH, url).json(&body))
            .await
            .map(|_| ())
            .map_err(reference_conflict)
    }

    async fn create_ref(
        &self,
        coordinate: &RepositoryCoordinate,
        commit_sha: &str,
    ) -> RemoteResult<()> {
        let url = self.repo_url(coordinate, ["git", "refs"]);
        let body = CreateRefRequest {
            reference: coordinate.full_ref_name(),
            sha: commit_sha,
        };

        self.send(self.request(Method::POST, url).json(&body))
            .await
            .map(|_| ())
            .map_err(reference_conflict)
    }
}

fn classify_failure(status: StatusCode, body: &str) -> RemoteError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        _ => RemoteError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

/// Reference writes answer 422 when the update is not a fast forward or the ref already exists.
fn reference_conflict(error: RemoteError) -> RemoteError {
    match error {
        RemoteError::Status {
            status: 422,
            message,
        } => RemoteError::Conflict(message),
        other => other,
    }
}

fn expect_sha(sha: String) -> RemoteResult<String> {
    if Validator::is_object_sha(&sha) {
        Ok(sha)
    } else {
        Err(RemoteError::Decode(format!("not an object id: {}", sha)))
    }
}
