//! Missing command: list roster students absent from a score report.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::report::missing::{find_missing, recorded_ids};
use crate::roster::Roster;

/// Options for the missing command.
#[derive(Debug, Clone, Default)]
pub struct MissingOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// One absent student in the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingStudent {
    pub id: String,
    pub name: String,
    pub section: String,
}

/// Output format for the missing command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingOutput {
    /// Whether the diff succeeded.
    pub success: bool,
    /// Number of absent students.
    pub count: usize,
    /// The absent students, in roster order.
    pub students: Vec<MissingStudent>,
    /// Error message if the diff failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MissingOutput {
    fn success(students: Vec<MissingStudent>) -> Self {
        Self {
            success: true,
            count: students.len(),
            students,
            error: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: 0,
            students: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The missing command implementation.
#[derive(Debug, Default)]
pub struct MissingCommand;

impl MissingCommand {
    /// Create a new missing command.
    pub fn new() -> Self {
        Self
    }

    /// Diff the roster against the report's recorded IDs.
    pub fn run(&self, roster_path: &Path, report_path: &Path) -> MissingOutput {
        let roster = match Roster::load(roster_path) {
            Ok(roster) => roster,
            Err(e) => return MissingOutput::failure(e.to_string()),
        };
        let recorded = match recorded_ids(report_path) {
            Ok(ids) => ids,
            Err(e) => return MissingOutput::failure(e.to_string()),
        };

        let students = find_missing(&roster, &recorded)
            .into_iter()
            .map(|s| MissingStudent {
                id: s.id.clone(),
                name: s.name.clone(),
                section: s.section.clone(),
            })
            .collect();

        MissingOutput::success(students)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &MissingOutput, options: &MissingOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Diff failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.students.is_empty() {
            return "Everyone on the roster has a recorded score.".to_string();
        }

        let mut lines = vec!["Students who didn't turn in homework/exam papers:".to_string()];
        for student in &output.students {
            lines.push(format!(
                "{}\t{}\t{}",
                student.id, student.section, student.name
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_fixtures(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let roster = dir.join("roster.txt");
        fs::write(
            &roster,
            [
                "2017001\tA\tKIM MINSOO\tCS\t-\t3\t3",
                "2017002\tA\tLEE JIWON\tEE\tCS\t2\t3",
                "2017003\tB\tPARK CHANHO\tME\t-\t4\t3",
            ]
            .join("\n"),
        )
        .unwrap();

        let report = dir.join("quiz1.csv");
        fs::write(
            &report,
            "\"id\",\"name\",\"total\"\n2017001,\"KIM MINSOO\",22\n",
        )
        .unwrap();

        (roster, report)
    }

    #[test]
    fn test_run_lists_absentees_in_roster_order() {
        let temp = TempDir::new().unwrap();
        let (roster, report) = write_fixtures(temp.path());

        let output = MissingCommand::new().run(&roster, &report);

        assert!(output.success);
        assert_eq!(output.count, 2);
        assert_eq!(output.students[0].id, "2017002");
        assert_eq!(output.students[1].id, "2017003");
    }

    #[test]
    fn test_run_missing_roster_fails() {
        let temp = TempDir::new().unwrap();
        let (_, report) = write_fixtures(temp.path());

        let output = MissingCommand::new().run(&temp.path().join("nope.txt"), &report);
        assert!(!output.success);
        assert!(output.error.is_some());
    }

    #[test]
    fn test_format_output_text() {
        let temp = TempDir::new().unwrap();
        let (roster, report) = write_fixtures(temp.path());

        let cmd = MissingCommand::new();
        let output = cmd.run(&roster, &report);
        let formatted = cmd.format_output(&output, &MissingOptions::default());

        assert!(formatted.contains("didn't turn in"));
        assert!(formatted.contains("LEE JIWON"));
        assert!(formatted.contains("PARK CHANHO"));
        assert!(!formatted.contains("KIM MINSOO"));
    }

    #[test]
    fn test_format_output_json() {
        let cmd = MissingCommand::new();
        let output = MissingOutput::success(vec![]);
        let options = MissingOptions {
            json: true,
            ..Default::default()
        };

        let formatted = cmd.format_output(&output, &options);
        assert!(formatted.contains("\"success\": true"));
        assert!(formatted.contains("\"count\": 0"));
    }

    #[test]
    fn test_format_output_empty_roster_all_recorded() {
        let cmd = MissingCommand::new();
        let output = MissingOutput::success(vec![]);
        let formatted = cmd.format_output(&output, &MissingOptions::default());

        assert!(formatted.contains("Everyone"));
    }

    #[test]
    fn test_format_output_quiet() {
        let cmd = MissingCommand::new();
        let output = MissingOutput::success(vec![]);
        let options = MissingOptions {
            quiet: true,
            ..Default::default()
        };

        assert!(cmd.format_output(&output, &options).is_empty());
    }
}
