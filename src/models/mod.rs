// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod coordinate;
pub mod snapshot;
pub mod sync_result;

pub use coordinate::{BranchHead, RepositoryCoordinate};
pub use snapshot::{FileEntry, FileMode, TreeItem, TreeSnapshot};
pub use sync_result::{PublishReceipt, PublishStep, SyncResult};
