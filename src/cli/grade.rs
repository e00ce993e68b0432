//! Interactive grading command.
//!
//! Wires the roster, snapshot store, and terminal frontend around the
//! session state machine, then writes the report for the termination
//! paths that call for one.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::core::session::{Flow, GradingSession};
use crate::error::Result;
use crate::report;
use crate::roster::Roster;
use crate::storage::FileSnapshotStore;
use crate::ui;

/// How a grading session ended, for the final message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeOutcome {
    /// The flow the session loop returned with.
    pub flow: Flow,
    /// Report path, when one was written.
    pub report_path: Option<PathBuf>,
    /// Records accumulated over the session (including recovered ones).
    pub graded: usize,
}

/// The grade command implementation.
pub struct GradeCommand {
    config: Config,
}

impl GradeCommand {
    /// Create a new grade command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run a grading session for `subject`.
    ///
    /// Loads the roster, resumes from a snapshot when one exists, prompts
    /// for a rubric otherwise, and drives the terminal loop to one of the
    /// termination paths. Completion and interrupt write the report;
    /// abort and reset do not.
    pub fn run(&self, subject: &str) -> Result<GradeOutcome> {
        let roster = Roster::load(Path::new(&self.config.roster.path))?;
        let store = FileSnapshotStore::new(&self.config.snapshot.dir)?;
        let mut session = GradingSession::new(subject, &roster, &store, &self.config)?;

        if session.needs_rubric() {
            ui::prompt_rubric(&mut session)?;
        }

        let flow = ui::run(&mut session)?;

        let report_path = match flow {
            Flow::Done | Flow::Interrupted => {
                let path = PathBuf::from(format!("{}.csv", subject));
                report::write_report(
                    &path,
                    &roster,
                    &session.state().rubric,
                    &session.state().records,
                    &session.state().modifiers,
                )?;
                Some(path)
            }
            _ => None,
        };

        Ok(GradeOutcome {
            flow,
            report_path,
            graded: session.state().records.len(),
        })
    }

    /// Final message printed after the screen is torn down.
    pub fn format_outcome(&self, outcome: &GradeOutcome) -> String {
        let report = outcome
            .report_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        match outcome.flow {
            Flow::Done => format!(
                "All {} students graded. Report written to {}.",
                outcome.graded, report
            ),
            Flow::Interrupted => format!(
                "Interrupted with {} records saved. Report written to {}.",
                outcome.graded, report
            ),
            Flow::Aborted => "Session aborted; snapshot kept for resume.".to_string(),
            Flow::Swiped => "> CACHE SWIPED! Start over with a fresh rubric.".to_string(),
            Flow::Continue => String::new(),
        }
    }
}
