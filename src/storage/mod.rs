//! Session snapshot storage for tally.
//!
//! This module provides durable storage for the resume tuple of a grading
//! session, supporting file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use traits::{Snapshot, SnapshotStore};
