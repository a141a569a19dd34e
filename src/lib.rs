// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod models;
pub mod publisher;
pub mod remote;
pub mod repository;
pub mod utils;

pub use config::{Config, GithubConfig, PublishConfig};
pub use error::{PublishError, RemoteError, Result};
pub use models::{
    BranchHead, FileEntry, FileMode, PublishReceipt, PublishStep, RepositoryCoordinate,
    SyncResult, TreeItem, TreeSnapshot,
};
pub use publisher::{SnapshotBuilder, SnapshotPublisher};
pub use remote::{GithubClient, InMemoryHost, RepositoryHost};
pub use repository::{DirectoryWalker, relative_repo_path};
pub use utils::{OperationTimer, PerformanceMetrics, Validator};
