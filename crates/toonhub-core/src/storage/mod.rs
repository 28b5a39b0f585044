//! Storage layer
//!
//! Handles persistence of the entry collection as a single JSON snapshot.
//!
//! ## Architecture
//!
//! - **Snapshot**: the whole collection is re-serialized on every mutation
//! - **Atomic writes**: temp file + fsync + rename, never a partial file
//! - **Fail-soft reads**: an unreadable snapshot is backed up and the store
//!   starts empty instead of refusing to start

pub mod error;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::SnapshotPersistence;

pub(crate) use persistence::atomic_write_private;
