//! CLI commands for tally.
//!
//! - **grade**: the interactive grading session
//! - **merge**: fold a report column into a separate grading spreadsheet
//! - **missing**: list roster students absent from a report

pub mod grade;
pub mod merge;
pub mod missing;

pub use grade::{GradeCommand, GradeOutcome};
pub use merge::{MergeCommand, MergeOptions, MergeOutput};
pub use missing::{MissingCommand, MissingOptions, MissingOutput};
