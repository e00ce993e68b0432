//! File-based snapshot storage for tally.
//!
//! Snapshots are stored as dot-prefixed JSON files named after the
//! subject, e.g. `.quiz1.json`. Writes are atomic via temp file + rename,
//! so an interrupted write leaves the previous snapshot intact — the only
//! data-loss window the design accepts.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::error::{Result, TallyError};
use crate::storage::{Snapshot, SnapshotStore};

/// File-based snapshot storage.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    /// Directory where snapshot files are stored.
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Create a snapshot store rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| TallyError::storage(&dir, e))?;
        }

        Ok(Self { dir })
    }

    /// Get the path for a subject's snapshot file.
    fn snapshot_path(&self, subject: &str) -> PathBuf {
        self.dir.join(format!(".{}.json", subject))
    }

    /// Get the path for a temp file used during atomic writes.
    fn temp_path(&self, subject: &str) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", subject))
    }

    /// Write a snapshot atomically using temp file + rename.
    fn atomic_write(&self, subject: &str, snapshot: &Snapshot) -> Result<()> {
        let final_path = self.snapshot_path(subject);
        let temp_path = self.temp_path(subject);

        let json = serde_json::to_string_pretty(snapshot)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| TallyError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| TallyError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| TallyError::storage(&temp_path, e))?;
        }

        // Rename temp file to final path (atomic on POSIX)
        fs::rename(&temp_path, &final_path).map_err(|e| TallyError::storage(&final_path, e))?;

        Ok(())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, subject: &str) -> Result<Option<Snapshot>> {
        let path = self.snapshot_path(subject);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| TallyError::storage(&path, e))?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;

        Ok(Some(snapshot))
    }

    fn save(&self, subject: &str, snapshot: &Snapshot) -> Result<()> {
        self.atomic_write(subject, snapshot)
    }

    fn delete(&self, subject: &str) -> Result<()> {
        let path = self.snapshot_path(subject);

        if path.exists() {
            fs::remove_file(&path).map_err(|e| TallyError::storage(&path, e))?;
        }

        // Also clean up any temp file left by an interrupted write.
        let temp_path = self.temp_path(subject);
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::{sample_snapshot, test_snapshot_store_crud};
    use tempfile::TempDir;

    fn create_test_store() -> (FileSnapshotStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_file_snapshot_store_crud() {
        let (store, _dir) = create_test_store();
        test_snapshot_store_crud(&store);
    }

    #[test]
    fn test_new_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("snapshots");

        assert!(!nested.exists());
        let _store = FileSnapshotStore::new(&nested).unwrap();
        assert!(nested.exists());
        assert!(nested.is_dir());
    }

    #[test]
    fn test_snapshot_path_is_dot_prefixed() {
        let (store, _dir) = create_test_store();
        let path = store.snapshot_path("quiz1");
        assert!(path.ends_with(".quiz1.json"));
    }

    #[test]
    fn test_roundtrip_identity() {
        let (store, _dir) = create_test_store();
        let snapshot = sample_snapshot();

        store.save("midterm", &snapshot).unwrap();
        let loaded = store.load("midterm").unwrap().unwrap();

        assert_eq!(loaded.rubric, snapshot.rubric);
        assert_eq!(loaded.remaining, snapshot.remaining);
        assert_eq!(loaded.records, snapshot.records);
        assert_eq!(loaded.modifiers, snapshot.modifiers);
    }

    #[test]
    fn test_atomic_write_leaves_valid_json() {
        let (store, _dir) = create_test_store();
        store.save("quiz1", &sample_snapshot()).unwrap();

        let content = fs::read_to_string(store.snapshot_path("quiz1")).unwrap();
        let parsed: Snapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.rubric, vec![10, 20]);
    }

    #[test]
    fn test_temp_file_cleaned_up_after_save() {
        let (store, _dir) = create_test_store();
        store.save("quiz1", &sample_snapshot()).unwrap();
        assert!(!store.temp_path("quiz1").exists());
    }

    #[test]
    fn test_load_nonexistent() {
        let (store, _dir) = create_test_store();
        assert!(store.load("nope").unwrap().is_none());
    }

    #[test]
    fn test_delete_removes_stale_temp_file() {
        let (store, dir) = create_test_store();
        store.save("quiz1", &sample_snapshot()).unwrap();
        fs::write(dir.path().join(".quiz1.json.tmp"), "{}").unwrap();

        store.delete("quiz1").unwrap();

        assert!(!store.snapshot_path("quiz1").exists());
        assert!(!store.temp_path("quiz1").exists());
    }
}
