//! Report generation and the batch operations built on exported reports.

pub mod export;
pub mod merge;
pub mod missing;

pub use export::write_report;
pub use merge::{merge_files, read_headers, MergeSummary};
pub use missing::{find_missing, recorded_ids};
