//! Unified error types for tally.
//!
//! Keystroke-level rejections are not errors; they are handled inside the
//! session state machine by reverting the input buffer. Everything surfaced
//! through this module is a real failure: unreadable roster, malformed
//! rubric, snapshot I/O, report I/O. Snapshot failures in particular are
//! fatal, because the resume guarantee cannot be kept without a durable
//! snapshot.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tally operations.
#[derive(Error, Debug)]
pub enum TallyError {
    /// I/O errors from snapshot or report file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON serialization errors for the session snapshot.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Roster file missing or malformed.
    #[error("roster error: {message}")]
    Roster { message: String },

    /// Rubric line could not be parsed into positive integers.
    #[error("rubric error: {message}")]
    Rubric { message: String },

    /// CSV report read/write errors (export, merge, missing).
    #[error("report error: {message}")]
    Report { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Terminal setup or event-read errors.
    #[error("terminal error: {source}")]
    Terminal {
        #[source]
        source: io::Error,
    },
}

/// A specialized Result type for tally operations.
pub type Result<T> = std::result::Result<T, TallyError>;

impl TallyError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a roster error.
    pub fn roster(message: impl Into<String>) -> Self {
        Self::Roster {
            message: message.into(),
        }
    }

    /// Create a rubric error.
    pub fn rubric(message: impl Into<String>) -> Self {
        Self::Rubric {
            message: message.into(),
        }
    }

    /// Create a report error.
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a terminal error from an I/O error.
    pub fn terminal(source: io::Error) -> Self {
        Self::Terminal { source }
    }
}

impl From<io::Error> for TallyError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for TallyError {
    fn from(err: csv::Error) -> Self {
        Self::Report {
            message: err.to_string(),
        }
    }
}
