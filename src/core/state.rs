//! Session state types for tally.
//!
//! These types hold the runtime state of a grading session: the current
//! input mode, the typing buffers, the rubric, and the record book. The
//! record book portion (`rubric`, `remaining`, `records`, `modifiers`) is
//! what gets snapshotted and restored; everything else is transient.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::bonus::Modifier;

/// Which mode the command overlay was entered from, and returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorMode {
    Name,
    Grade,
}

/// Input mode of the grading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Session bootstrap: waiting for the rubric line. Skipped when a
    /// snapshot was recovered.
    Rubric,
    /// Typing a partial student name to search.
    Name,
    /// Typing per-question scores for the selected student.
    Grade,
    /// Command overlay, reentrant from Name or Grade.
    Command { prior: PriorMode },
    /// Every student graded; the session is over.
    Done,
}

impl Mode {
    /// Whether the session accepts further grading input.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Mode::Done)
    }
}

/// One finalized grading result.
///
/// Created once per student and immutable thereafter. `scores` always has
/// exactly one entry per rubric question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    /// Roster index of the graded student.
    pub student: usize,
    /// Per-question scores, parallel to the rubric.
    pub scores: Vec<f64>,
}

impl GradeRecord {
    pub fn new(student: usize, scores: Vec<f64>) -> Self {
        Self { student, scores }
    }

    /// Unadjusted sum of the per-question scores.
    pub fn raw_sum(&self) -> f64 {
        self.scores.iter().sum()
    }
}

/// Mutable aggregate state of a grading session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Current input mode.
    pub mode: Mode,
    /// Characters typed so far in Name or Grade mode.
    pub buffer: String,
    /// Characters typed so far in the command overlay.
    pub command: String,
    /// Per-question maxima, fixed once set.
    pub rubric: Vec<u32>,
    /// Selected student, set by name search, cleared after commit.
    pub selected: Option<usize>,
    /// Roster indices not yet graded; iteration order is roster order.
    pub remaining: BTreeSet<usize>,
    /// Finalized records, in commit order.
    pub records: Vec<GradeRecord>,
    /// Per-student bonus/penalty modifiers; absence is neutral.
    pub modifiers: BTreeMap<usize, Modifier>,
    /// Current name-search result, in roster order.
    pub matches: Vec<usize>,
}

impl SessionState {
    /// Fresh state for a roster of `students` entries, starting at the
    /// rubric prompt with everyone ungraded.
    pub fn new(students: usize) -> Self {
        Self {
            mode: Mode::Rubric,
            buffer: String::new(),
            command: String::new(),
            rubric: Vec::new(),
            selected: None,
            remaining: (0..students).collect(),
            records: Vec::new(),
            modifiers: BTreeMap::new(),
            matches: Vec::new(),
        }
    }

    /// Sum of the rubric maxima.
    pub fn max_total(&self) -> u32 {
        self.rubric.iter().sum()
    }

    /// Record a finalized grade for a student.
    ///
    /// This is the single enforcement point of "grade each student at most
    /// once": a no-op when `student` is unset, out of roster bounds, or no
    /// longer in the remaining set. Returns whether a record was appended.
    pub fn record(&mut self, student: Option<usize>, scores: Vec<f64>, roster_len: usize) -> bool {
        let Some(idx) = student else {
            return false;
        };
        if idx >= roster_len || !self.remaining.contains(&idx) {
            return false;
        }

        self.records.push(GradeRecord::new(idx, scores));
        self.remaining.remove(&idx);
        true
    }

    /// Whether every student has been graded.
    pub fn all_graded(&self) -> bool {
        self.remaining.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = SessionState::new(3);

        assert_eq!(state.mode, Mode::Rubric);
        assert_eq!(state.remaining.len(), 3);
        assert!(state.records.is_empty());
        assert!(state.modifiers.is_empty());
        assert!(state.selected.is_none());
    }

    #[test]
    fn test_record_removes_from_remaining() {
        let mut state = SessionState::new(3);
        state.rubric = vec![10, 20];

        assert!(state.record(Some(1), vec![7.0, 15.0], 3));

        assert!(!state.remaining.contains(&1));
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].student, 1);
        assert_eq!(state.records[0].raw_sum(), 22.0);
    }

    #[test]
    fn test_record_noop_when_unset() {
        let mut state = SessionState::new(3);
        assert!(!state.record(None, vec![7.0], 3));
        assert!(state.records.is_empty());
        assert_eq!(state.remaining.len(), 3);
    }

    #[test]
    fn test_record_noop_out_of_bounds() {
        let mut state = SessionState::new(3);
        assert!(!state.record(Some(5), vec![7.0], 3));
        assert!(state.records.is_empty());
    }

    #[test]
    fn test_record_noop_when_already_graded() {
        let mut state = SessionState::new(3);
        assert!(state.record(Some(0), vec![7.0], 3));
        assert!(!state.record(Some(0), vec![9.0], 3));

        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].scores, vec![7.0]);
    }

    #[test]
    fn test_student_in_exactly_one_record() {
        let mut state = SessionState::new(2);
        state.record(Some(0), vec![5.0], 2);
        state.record(Some(0), vec![6.0], 2);
        state.record(Some(1), vec![7.0], 2);

        let count = state.records.iter().filter(|r| r.student == 0).count();
        assert_eq!(count, 1);
        assert!(state.all_graded());
    }

    #[test]
    fn test_max_total() {
        let mut state = SessionState::new(1);
        state.rubric = vec![10, 20, 5];
        assert_eq!(state.max_total(), 35);
    }

    #[test]
    fn test_mode_terminal() {
        assert!(Mode::Done.is_terminal());
        assert!(!Mode::Name.is_terminal());
        assert!(!Mode::Command { prior: PriorMode::Grade }.is_terminal());
    }
}
