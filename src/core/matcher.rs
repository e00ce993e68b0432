//! Name search over the remaining (ungraded) students.
//!
//! The typed buffer is split on spaces into tokens; each token must match
//! the student's name at a word boundary, case-insensitively, and all
//! tokens must match (order-independent). Only students still in the
//! remaining set are candidates, which is what makes re-grading a student
//! structurally impossible: a recorded student never reappears in the
//! match list.

use std::collections::BTreeSet;

use regex::Regex;

use crate::roster::Roster;

/// Minimum buffer length before a search fires.
pub const MIN_QUERY_LEN: usize = 3;

/// Search the remaining students for names matching every buffer token.
///
/// Matches are returned in the remaining set's iteration order, which is
/// roster order.
pub fn search(buffer: &str, remaining: &BTreeSet<usize>, roster: &Roster) -> Vec<usize> {
    let patterns: Vec<Regex> = buffer
        .split_whitespace()
        .map(|token| format!(r"(?i)\b{}", regex::escape(token)))
        .filter_map(|pattern| Regex::new(&pattern).ok())
        .collect();

    if patterns.is_empty() {
        return Vec::new();
    }

    remaining
        .iter()
        .copied()
        .filter(|&idx| {
            let name = roster.name(idx);
            patterns.iter().all(|p| p.is_match(name))
        })
        .collect()
}
