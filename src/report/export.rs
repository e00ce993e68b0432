//! CSV score report export.
//!
//! One row per graded student: the roster fields, the per-question scores,
//! the bonus/penalty raw value ("bop"), and the adjusted total. Numeric
//! fields are emitted bare; everything else is quoted, which is exactly
//! the csv crate's `NonNumeric` quote style.

use std::collections::BTreeMap;
use std::path::Path;

use csv::{QuoteStyle, WriterBuilder};

use crate::core::bonus::{adjusted_total, Modifier};
use crate::core::state::GradeRecord;
use crate::core::validator::canonical;
use crate::error::Result;
use crate::roster::{Roster, FIELD_NAMES};

/// Write the score report for a session.
pub fn write_report(
    path: &Path,
    roster: &Roster,
    rubric: &[u32],
    records: &[GradeRecord],
    modifiers: &BTreeMap<usize, Modifier>,
) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_path(path)?;

    let max_total: u32 = rubric.iter().sum();

    let mut header: Vec<String> = FIELD_NAMES.iter().map(|f| f.to_string()).collect();
    for question in 1..=rubric.len() {
        header.push(format!("q{}", question));
    }
    header.push("bop".to_string());
    header.push("total".to_string());
    writer.write_record(&header)?;

    for record in records {
        let Some(student) = roster.get(record.student) else {
            tracing::warn!(
                student = record.student,
                "record points outside the roster; skipping row"
            );
            continue;
        };

        let modifier = modifiers.get(&record.student);

        let mut row: Vec<String> = student.fields().iter().map(|f| f.to_string()).collect();
        for score in &record.scores {
            row.push(canonical(*score));
        }
        row.push(modifier.map_or_else(|| "0".to_string(), |m| m.to_string()));
        row.push(adjusted_total(record.raw_sum(), modifier, max_total).to_string());

        writer.write_record(&row)?;
    }

    writer.flush().map_err(|e| crate::error::TallyError::report(e.to_string()))?;
    Ok(())
}
