// file: src/config.rs
// description: application configuration management with toml and json support
// reference: https://docs.rs/config

use crate::error::{PublishError, Result};
use crate::models::RepositoryCoordinate;
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

type Table = config::Map<String, config::Value>;

// older config.json spellings, plus the lowercased forms of them
const KEY_ALIASES: &[(&str, &str)] = &[
    ("repoName", "repo_name"),
    ("reponame", "repo_name"),
    ("branchName", "branch_name"),
    ("branchname", "branch_name"),
    ("commitMessage", "commit_message"),
    ("commitmessage", "commit_message"),
];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub github: GithubConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

/// Credentials and target of a publish. The camelCase keys of the older flat
/// `config.json` layout are folded onto these names before deserializing.
#[derive(Clone, Deserialize, Serialize)]
pub struct GithubConfig {
    pub token: String,
    pub owner: String,
    pub repo_name: String,
    pub branch_name: String,
    pub commit_message: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// keeps the token out of logs
impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &"***")
            .field("owner", &self.owner)
            .field("repo_name", &self.repo_name)
            .field("branch_name", &self.branch_name)
            .field("commit_message", &self.commit_message)
            .field("api_url", &self.api_url)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default = "default_read_concurrency")]
    pub read_concurrency: usize,
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            read_concurrency: default_read_concurrency(),
            show_progress: default_show_progress(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    concat!("git_publish/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_read_concurrency() -> usize {
    8
}

fn default_show_progress() -> bool {
    true
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("GIT_PUBLISH")
        .separator("__")
        .try_parsing(true)
}

fn config_error(e: config::ConfigError) -> PublishError {
    PublishError::Config(e.to_string())
}

/// Renames alias keys to their canonical name. A canonical key already in the
/// table is kept, so `GIT_PUBLISH__GITHUB__REPO_NAME` beats a file's `repoName`.
fn canonical_keys(mut table: Table) -> Table {
    for (alias, canonical) in KEY_ALIASES {
        if let Some(value) = table.remove(*alias) {
            table.entry(canonical.to_string()).or_insert(value);
        }
    }
    table
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(environment())
            .build()
            .map_err(config_error)?;

        Self::from_settings(settings)
    }

    /// The publish record may sit under `[github]` or, as in the older
    /// `config.json`, at the top level. Section keys win over top-level ones.
    fn from_settings(settings: config::Config) -> Result<Self> {
        let mut root: Table = settings.try_deserialize().map_err(config_error)?;

        let section = root
            .remove("github")
            .map(|value| value.into_table())
            .transpose()
            .map_err(config_error)?;
        let publish = root.remove("publish");

        let mut record = canonical_keys(root);
        if let Some(section) = section {
            record.extend(canonical_keys(section));
        }

        let github: GithubConfig = config::Value::new(None, config::ValueKind::Table(record))
            .try_deserialize()
            .map_err(config_error)?;
        let publish = match publish {
            Some(value) => value.try_deserialize().map_err(config_error)?,
            None => PublishConfig::default(),
        };

        let config = Config { github, publish };
        config.validate()?;
        Ok(config)
    }

    pub fn coordinate(&self) -> RepositoryCoordinate {
        RepositoryCoordinate::new(
            self.github.owner.clone(),
            self.github.repo_name.clone(),
            self.github.branch_name.clone(),
        )
    }

    fn validate(&self) -> Result<()> {
        Validator::validate_required("github.token", &self.github.token)?;
        Validator::validate_required("github.owner", &self.github.owner)?;
        Validator::validate_required("github.repo_name", &self.github.repo_name)?;
        Validator::validate_required("github.commit_message", &self.github.commit_message)?;
        Validator::validate_branch_name(&self.github.branch_name)?;
        Validator::validate_url(&self.github.api_url)?;

        if self.github.timeout_secs == 0 {
            return Err(PublishError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.publish.read_concurrency == 0 {
            return Err(PublishError::Config(
                "read_concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
