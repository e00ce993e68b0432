//! In-memory snapshot storage for testing.
//!
//! Thread-safe implementation of the SnapshotStore trait, primarily for
//! use in unit tests of the session state machine.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::storage::{Snapshot, SnapshotStore};

/// In-memory snapshot store for testing.
///
/// Snapshots are stored in memory and lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<HashMap<String, Snapshot>>,
}

impl MemorySnapshotStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of snapshots in the store.
    pub fn len(&self) -> usize {
        self.snapshots.read().unwrap().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshots.read().unwrap().is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, subject: &str) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().unwrap();
        Ok(snapshots.get(subject).cloned())
    }

    fn save(&self, subject: &str, snapshot: &Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().unwrap();
        snapshots.insert(subject.to_string(), snapshot.clone());
        Ok(())
    }

    fn delete(&self, subject: &str) -> Result<()> {
        let mut snapshots = self.snapshots.write().unwrap();
        snapshots.remove(subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::{sample_snapshot, test_snapshot_store_crud};

    #[test]
    fn test_memory_snapshot_store_crud() {
        let store = MemorySnapshotStore::new();
        test_snapshot_store_crud(&store);
    }

    #[test]
    fn test_len_and_empty() {
        let store = MemorySnapshotStore::new();
        assert!(store.is_empty());

        store.save("quiz1", &sample_snapshot()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }
}
