//! tally - keystroke-driven grading sessions
//!
//! CLI entry point with a panic handler that restores the terminal.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tally::cli::{MergeOptions, MissingOptions};
use tally::config::{tally_home, Config};
use tally::{GradeCommand, MergeCommand, MissingCommand};

// =============================================================================
// CLI Definition
// =============================================================================

/// tally - keystroke-driven grading sessions over a course roster
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive grading session for a subject
    Grade {
        /// Session name; keys the snapshot and the exported report
        subject: String,
    },

    /// Merge a report score column into a separate grading spreadsheet
    Merge {
        /// Exported score report (CSV)
        report: PathBuf,
        /// Grading spreadsheet to merge into (CSV)
        sheet: PathBuf,
        /// 1-based report column to copy from (prompted when omitted)
        #[arg(long)]
        from_col: Option<usize>,
        /// 1-based sheet column to copy into (prompted when omitted)
        #[arg(long)]
        to_col: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List roster students with no recorded score in a report
    Missing {
        /// Tab-separated roster file
        roster: PathBuf,
        /// Exported score report (CSV)
        report: PathBuf,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("tally error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Set up the global panic handler.
///
/// The grading screen runs in raw mode; a panic must restore the terminal
/// before anything is printed. The panic is also appended to
/// ~/.tally/crash.log for later inspection.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        eprintln!("tally panic: {}", info);

        if let Some(home) = tally_home() {
            let _ = std::fs::create_dir_all(&home);
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(2);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Grade { subject } => run_grade(&subject),
        Commands::Merge {
            report,
            sheet,
            from_col,
            to_col,
            json,
            quiet,
        } => run_merge(&report, &sheet, from_col, to_col, json, quiet),
        Commands::Missing {
            roster,
            report,
            json,
            quiet,
        } => run_missing(&roster, &report, json, quiet),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn run_grade(subject: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load();
    let cmd = GradeCommand::new(config);

    let outcome = cmd.run(subject)?;
    let formatted = cmd.format_outcome(&outcome);

    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    // Every interactive termination path (completion, abort, interrupt,
    // reset) is a normal exit; only real failures reach the Err arm.
    Ok(ExitCode::SUCCESS)
}

fn run_merge(
    report: &std::path::Path,
    sheet: &std::path::Path,
    from_col: Option<usize>,
    to_col: Option<usize>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = MergeCommand::new();
    let options = MergeOptions {
        from_col,
        to_col,
        json,
        quiet,
    };

    let output = cmd.run(report, sheet, &options);
    let formatted = cmd.format_output(&output, &options);

    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_missing(
    roster: &std::path::Path,
    report: &std::path::Path,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = MissingCommand::new();
    let options = MissingOptions { json, quiet };

    let output = cmd.run(roster, report);
    let formatted = cmd.format_output(&output, &options);

    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_grade() {
        let cli = Cli::parse_from(["tally", "grade", "quiz1"]);
        match cli.command {
            Commands::Grade { subject } => assert_eq!(subject, "quiz1"),
            _ => panic!("Expected Grade command"),
        }
    }

    #[test]
    fn test_cli_requires_subject() {
        let result = Cli::try_parse_from(["tally", "grade"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_merge() {
        let cli = Cli::parse_from([
            "tally",
            "merge",
            "quiz1.csv",
            "sheet.csv",
            "--from-col",
            "10",
            "--to-col",
            "3",
        ]);
        match cli.command {
            Commands::Merge {
                report,
                sheet,
                from_col,
                to_col,
                ..
            } => {
                assert_eq!(report, PathBuf::from("quiz1.csv"));
                assert_eq!(sheet, PathBuf::from("sheet.csv"));
                assert_eq!(from_col, Some(10));
                assert_eq!(to_col, Some(3));
            }
            _ => panic!("Expected Merge command"),
        }
    }

    #[test]
    fn test_cli_parse_merge_without_columns() {
        let cli = Cli::parse_from(["tally", "merge", "quiz1.csv", "sheet.csv"]);
        match cli.command {
            Commands::Merge {
                from_col, to_col, ..
            } => {
                assert!(from_col.is_none());
                assert!(to_col.is_none());
            }
            _ => panic!("Expected Merge command"),
        }
    }

    #[test]
    fn test_cli_parse_missing() {
        let cli = Cli::parse_from(["tally", "missing", "roster.txt", "quiz1.csv", "--json"]);
        match cli.command {
            Commands::Missing {
                roster,
                report,
                json,
                quiet,
            } => {
                assert_eq!(roster, PathBuf::from("roster.txt"));
                assert_eq!(report, PathBuf::from("quiz1.csv"));
                assert!(json);
                assert!(!quiet);
            }
            _ => panic!("Expected Missing command"),
        }
    }

    #[test]
    fn test_cli_parse_merge_short_flags() {
        let cli = Cli::parse_from(["tally", "merge", "quiz1.csv", "sheet.csv", "-j", "-q"]);
        match cli.command {
            Commands::Merge { json, quiet, .. } => {
                assert!(json);
                assert!(quiet);
            }
            _ => panic!("Expected Merge command"),
        }
    }
}
