// file: src/publisher/mod.rs
// description: snapshot publish module exports
// reference: internal module structure

pub mod orchestrator;
pub mod progress;
pub mod snapshot;

pub use orchestrator::SnapshotPublisher;
pub use progress::ReadProgress;
pub use snapshot::{PendingFile, SnapshotBuilder};
