//! Merge an exported score report into a grading spreadsheet.
//!
//! The spreadsheet names students differently from the roster (split or
//! hyphenated name columns), so rows are matched fuzzily: the first two
//! sheet columns are split into name components and a report row matches
//! when every component is found in its name field, case-insensitively.
//! Matched rows get the chosen report column copied in; unmatched rows
//! get "0".

use std::path::{Path, PathBuf};

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use regex::Regex;

use crate::error::{Result, TallyError};

/// Outcome counters for a merge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    /// Sheet rows that found a matching report row.
    pub hits: usize,
    /// Sheet rows filled with "0".
    pub misses: usize,
    /// Where the merged sheet was written.
    pub out_path: PathBuf,
}

/// Read the header row of a CSV file.
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = reader.records();
    match rows.next() {
        Some(row) => Ok(row?.iter().map(|f| f.to_string()).collect()),
        None => Err(TallyError::report(format!(
            "{} is empty; expected a header row",
            path.display()
        ))),
    }
}

fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(rows)
}

/// Name components of a sheet row: its first two columns split on spaces
/// and hyphens.
fn name_components(row: &[String]) -> Vec<String> {
    row.iter()
        .take(2)
        .flat_map(|field| field.split(['-', ' ']))
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}

fn matches_name(components: &[String], name: &str) -> bool {
    !components.is_empty()
        && components.iter().all(|part| {
            Regex::new(&format!(r"(?i){}", regex::escape(part)))
                .map(|re| re.is_match(name))
                .unwrap_or(false)
        })
}

/// Copy the report score into a matched sheet row, truncating fractional
/// scores the way the spreadsheet expects whole numbers.
fn transfer_value(raw: &str) -> String {
    match raw.parse::<f64>() {
        Ok(value) => format!("{}", value.trunc() as i64),
        Err(_) => raw.to_string(),
    }
}

/// Merge `from_col` of the report into `to_col` of the sheet (0-based,
/// counted past each file's header row), writing `final_<sheet name>`
/// next to the sheet.
pub fn merge_files(
    report_path: &Path,
    sheet_path: &Path,
    from_col: usize,
    to_col: usize,
) -> Result<MergeSummary> {
    let report_rows = read_rows(report_path)?;
    let mut sheet_rows = read_rows(sheet_path)?;

    if report_rows.is_empty() {
        return Err(TallyError::report(format!(
            "{} is empty; expected a header row",
            report_path.display()
        )));
    }
    if sheet_rows.is_empty() {
        return Err(TallyError::report(format!(
            "{} is empty; expected a header row",
            sheet_path.display()
        )));
    }

    let records = &report_rows[1..];
    let mut hits = 0;
    let mut misses = 0;

    for row in sheet_rows.iter_mut().skip(1) {
        if row.len() <= to_col {
            row.resize(to_col + 1, String::new());
        }

        let components = name_components(row);
        let matched = records.iter().find(|record| {
            record
                .get(2)
                .is_some_and(|name| matches_name(&components, name))
        });

        match matched {
            Some(record) => {
                let value = record.get(from_col).map(String::as_str).unwrap_or("0");
                row[to_col] = transfer_value(value);
                hits += 1;
            }
            None => {
                tracing::debug!(components = %components.join(" "), "no report row matched");
                row[to_col] = "0".to_string();
                misses += 1;
            }
        }
    }

    let file_name = sheet_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "sheet.csv".to_string());
    let out_path = sheet_path.with_file_name(format!("final_{}", file_name));

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_path(&out_path)?;
    for row in &sheet_rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .map_err(|e| TallyError::report(e.to_string()))?;

    Ok(MergeSummary {
        hits,
        misses,
        out_path,
    })
}
