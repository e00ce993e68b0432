//! Merge command: copy a report score column into a grading spreadsheet.

use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};
use crate::report::merge::{merge_files, read_headers};

/// Options for the merge command.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// 1-based report column to copy from; prompted for when absent.
    pub from_col: Option<usize>,
    /// 1-based sheet column to copy into; prompted for when absent.
    pub to_col: Option<usize>,
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the merge command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOutput {
    /// Whether the merge succeeded.
    pub success: bool,
    /// Sheet rows matched to a report row.
    pub hits: usize,
    /// Sheet rows filled with "0".
    pub misses: usize,
    /// Where the merged sheet was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_path: Option<String>,
    /// Error message if the merge failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MergeOutput {
    fn success(hits: usize, misses: usize, out_path: String) -> Self {
        Self {
            success: true,
            hits,
            misses,
            out_path: Some(out_path),
            error: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            hits: 0,
            misses: 0,
            out_path: None,
            error: Some(error.into()),
        }
    }
}

/// The merge command implementation.
#[derive(Debug, Default)]
pub struct MergeCommand;

impl MergeCommand {
    /// Create a new merge command.
    pub fn new() -> Self {
        Self
    }

    /// Run the merge command.
    pub fn run(&self, report: &Path, sheet: &Path, options: &MergeOptions) -> MergeOutput {
        let (from_col, to_col) = match self.resolve_columns(report, sheet, options) {
            Ok(columns) => columns,
            Err(e) => return MergeOutput::failure(e.to_string()),
        };

        match merge_files(report, sheet, from_col, to_col) {
            Ok(summary) => MergeOutput::success(
                summary.hits,
                summary.misses,
                summary.out_path.display().to_string(),
            ),
            Err(e) => MergeOutput::failure(e.to_string()),
        }
    }

    /// Resolve the 0-based column pair, prompting interactively for any
    /// side the options leave unset.
    fn resolve_columns(
        &self,
        report: &Path,
        sheet: &Path,
        options: &MergeOptions,
    ) -> Result<(usize, usize)> {
        let report_headers = read_headers(report)?;
        let sheet_headers = read_headers(sheet)?;

        let from_col = match options.from_col {
            Some(col) => validate_column(col, report_headers.len(), "--from-col")?,
            None => prompt_column("[SCORE COLUMN TO MERGE FROM]", &report_headers)?,
        };
        let to_col = match options.to_col {
            Some(col) => validate_column(col, sheet_headers.len(), "--to-col")?,
            None => prompt_column("[SHEET COLUMN TO MERGE INTO]", &sheet_headers)?,
        };

        Ok((from_col, to_col))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &MergeOutput, options: &MergeOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Merge failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        format!(
            "HIT: {} MISS: {}\nMerged sheet written to {}.",
            output.hits,
            output.misses,
            output.out_path.as_deref().unwrap_or("?")
        )
    }
}

/// Check a 1-based CLI column index against a header row, returning it
/// 0-based.
fn validate_column(col: usize, len: usize, flag: &str) -> Result<usize> {
    if col == 0 || col > len {
        return Err(TallyError::report(format!(
            "{} must be between 1 and {}",
            flag, len
        )));
    }
    Ok(col - 1)
}

/// Print a numbered column list and read a 1-based choice from stdin.
fn prompt_column(title: &str, headers: &[String]) -> Result<usize> {
    println!("{}", title);
    for (i, header) in headers.iter().enumerate() {
        println!("{}. {}", i + 1, header);
    }

    let stdin = io::stdin();
    loop {
        print!("> COLUMN: ");
        io::stdout().flush().map_err(TallyError::terminal)?;

        let mut line = String::new();
        let read = stdin.read_line(&mut line).map_err(TallyError::terminal)?;
        if read == 0 {
            return Err(TallyError::report("no column selected (stdin closed)"));
        }

        if let Ok(choice) = line.trim().parse::<usize>() {
            if choice >= 1 && choice <= headers.len() {
                return Ok(choice - 1);
            }
        }
    }
}
