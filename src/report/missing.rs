//! List roster students absent from a score report.
//!
//! A student is missing when their roster ID never appears in the report's
//! first column. Plain set difference; the roster order is preserved in
//! the output.

use std::collections::BTreeSet;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::Result;
use crate::roster::{Roster, StudentRecord};

/// Collect the student IDs recorded in a report (first column, header
/// skipped).
pub fn recorded_ids(report_path: &Path) -> Result<BTreeSet<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(report_path)?;

    let mut ids = BTreeSet::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if i == 0 {
            continue; // header
        }
        if let Some(id) = record.get(0) {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

/// Roster entries whose ID is not in the recorded set, in roster order.
pub fn find_missing<'a>(roster: &'a Roster, recorded: &BTreeSet<String>) -> Vec<&'a StudentRecord> {
    roster
        .iter()
        .filter(|student| !recorded.contains(&student.id))
        .collect()
}
