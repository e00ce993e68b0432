//! Bonus/penalty modifiers for tally.
//!
//! A modifier adjusts one student's raw summed score at commit time. It is
//! set through the command overlay with `(+|-)<digits>(%?)`: a trailing `%`
//! makes the adjustment multiplicative (a scaling factor), otherwise it is
//! an absolute offset. Repeating the command for the same student
//! overwrites the previous modifier; modifiers never stack.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A per-student score adjustment.
///
/// The neutral case is the absence of a modifier; an absent modifier must
/// behave exactly as offset 0 / factor 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Modifier {
    /// Signed absolute offset added to the raw sum.
    Additive(i32),
    /// Scaling factor applied to the raw sum (`1 ± percent/100`).
    Multiplicative(f64),
}

fn command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([+-])(\d+)(%?)$").expect("valid regex"))
}

impl Modifier {
    /// Parse a bonus/penalty command.
    ///
    /// Returns `None` for anything outside the grammar, including values
    /// whose digits overflow.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = command_pattern().captures(text)?;
        let sign: i64 = if &caps[1] == "-" { -1 } else { 1 };
        let digits: i64 = caps[2].parse().ok()?;
        let amount = i32::try_from(sign * digits).ok()?;

        if caps[3].is_empty() {
            Some(Modifier::Additive(amount))
        } else {
            Some(Modifier::Multiplicative(1.0 + f64::from(amount) / 100.0))
        }
    }

    /// Apply this modifier to a raw sum.
    pub fn apply(&self, raw_sum: f64) -> f64 {
        match self {
            Modifier::Additive(offset) => raw_sum + f64::from(*offset),
            Modifier::Multiplicative(factor) => raw_sum * factor,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Additive(offset) => write!(f, "{:+}", offset),
            Modifier::Multiplicative(factor) => {
                let percent = ((factor - 1.0) * 100.0).round() as i32;
                write!(f, "{:+}%", percent)
            }
        }
    }
}

/// Compute the adjusted total for a raw sum.
///
/// The optional modifier is applied, the result rounded up to the nearest
/// whole number, then clamped into `[0, max_total]`.
pub fn adjusted_total(raw_sum: f64, modifier: Option<&Modifier>, max_total: u32) -> u32 {
    let adjusted = match modifier {
        Some(m) => m.apply(raw_sum),
        None => raw_sum,
    };
    adjusted.ceil().clamp(0.0, f64::from(max_total)) as u32
}
