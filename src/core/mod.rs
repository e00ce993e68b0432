//! Core types and logic for tally.
//!
//! This module contains the grading session state machine and the pure
//! pieces it is built from: the incremental score validator, the name
//! matcher, and the bonus/penalty engine.

pub mod bonus;
pub mod matcher;
pub mod session;
pub mod state;
pub mod validator;

pub use bonus::{adjusted_total, Modifier};
pub use matcher::MIN_QUERY_LEN;
pub use session::{Effect, Flow, GradingSession, Key};
pub use state::{GradeRecord, Mode, PriorMode, SessionState};
pub use validator::{canonical, classify, parse_token, Classification, Token};
