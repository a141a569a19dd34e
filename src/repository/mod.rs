// file: src/repository/mod.rs
// description: local filesystem side of a publish: discovery and path mapping
// reference: Internal module structure

pub mod paths;
pub mod walker;

pub use paths::relative_repo_path;
pub use walker::DirectoryWalker;
