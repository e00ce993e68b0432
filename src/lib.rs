//! tally - keystroke-driven grading sessions over a course roster
//!
//! A grader searches students by partial name, types per-question scores
//! that are validated digit-by-digit against a rubric, and can adjust a
//! student's final score with a bonus/penalty command. Sessions are
//! snapshotted as they go and resume after a crash; finishing (or
//! interrupting) a session exports a CSV score report.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod report;
pub mod roster;
pub mod storage;
pub mod ui;
pub mod util;

pub use config::Config;
pub use core::{
    adjusted_total, canonical, classify, parse_token, Classification, Effect, Flow, GradeRecord,
    GradingSession, Key, Mode, Modifier, SessionState, Token,
};
pub use error::{Result, TallyError};
pub use report::{find_missing, merge_files, recorded_ids, write_report, MergeSummary};
pub use roster::{Roster, StudentRecord};
pub use storage::{FileSnapshotStore, MemorySnapshotStore, Snapshot, SnapshotStore};

// CLI commands
pub use cli::{GradeCommand, MergeCommand, MissingCommand};
