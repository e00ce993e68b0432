//! Snapshot storage traits for tally.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::bonus::Modifier;
use crate::core::state::GradeRecord;
use crate::error::Result;

/// Durable image of an in-progress grading session.
///
/// Exactly the resume tuple: rubric, remaining indices, records, and
/// modifiers. Restoring a snapshot fully replaces the in-memory copies of
/// these four fields and skips the rubric prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Per-question maxima.
    pub rubric: Vec<u32>,
    /// Roster indices not yet graded.
    pub remaining: BTreeSet<usize>,
    /// Finalized records, in commit order.
    pub records: Vec<GradeRecord>,
    /// Per-student bonus/penalty modifiers.
    pub modifiers: BTreeMap<usize, Modifier>,
    /// When this snapshot was written.
    pub saved_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot of the given resume tuple, stamped now.
    pub fn new(
        rubric: Vec<u32>,
        remaining: BTreeSet<usize>,
        records: Vec<GradeRecord>,
        modifiers: BTreeMap<usize, Modifier>,
    ) -> Self {
        Self {
            rubric,
            remaining,
            records,
            modifiers,
            saved_at: Utc::now(),
        }
    }
}

/// Trait for snapshot storage backends.
///
/// A snapshot is keyed by the session's subject name. Implementations must
/// replace the stored snapshot wholesale on save, never patch it, so a
/// failed write leaves the previous snapshot intact.
pub trait SnapshotStore: Send + Sync {
    /// Retrieve the snapshot for a subject.
    ///
    /// Returns `Ok(None)` if no snapshot exists.
    fn load(&self, subject: &str) -> Result<Option<Snapshot>>;

    /// Save a snapshot, replacing any previous one.
    fn save(&self, subject: &str, snapshot: &Snapshot) -> Result<()>;

    /// Delete the snapshot for a subject.
    ///
    /// Returns `Ok(())` even if no snapshot exists.
    fn delete(&self, subject: &str) -> Result<()>;

    /// Check if a snapshot exists for a subject.
    fn exists(&self, subject: &str) -> Result<bool> {
        Ok(self.load(subject)?.is_some())
    }
}

/// Blanket implementation of SnapshotStore for Arc-wrapped stores.
impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn load(&self, subject: &str) -> Result<Option<Snapshot>> {
        (**self).load(subject)
    }

    fn save(&self, subject: &str, snapshot: &Snapshot) -> Result<()> {
        (**self).save(subject, snapshot)
    }

    fn delete(&self, subject: &str) -> Result<()> {
        (**self).delete(subject)
    }
}
