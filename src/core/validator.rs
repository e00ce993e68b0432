//! Incremental score validation for tally.
//!
//! Scores are typed one character at a time with no confirmation keystroke
//! in the common case. After every keypress the partially typed token is
//! classified against the rubric maximum for its question slot:
//!
//! - `Invalid` — the token can no longer stay within bounds; the caller
//!   reverts the whole token and signals the operator.
//! - `Continue` — a further digit could still keep the value in bounds;
//!   keep accumulating.
//! - `Complete` — the value is unambiguous now; the caller normalizes the
//!   token and advances to the next slot.
//!
//! Tokens are either plain digit runs, or the half-increment shorthand
//! "." followed by digits, where ".D" encodes `D + 0.5` (".7" is 7.5).
//! A lone "." is a wait state: not yet classifiable, not an error.

/// Outcome of classifying a partially typed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The token can never stay within bounds; revert it.
    Invalid,
    /// More digits could keep the value in bounds; keep typing.
    Continue,
    /// The value is unambiguous; finalize and advance.
    Complete,
}

/// A parsed grade token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    /// No characters typed yet for this slot.
    Empty,
    /// A lone "." awaiting its digits; neither valid nor invalid.
    Pending,
    /// A parsed numeric value (integer or half-integer).
    Value(f64),
    /// Syntactically unparseable; revert.
    Malformed,
}

/// Parse the textual form of a grade token.
pub fn parse_token(token: &str) -> Token {
    if token.is_empty() {
        return Token::Empty;
    }
    if token == "." {
        return Token::Pending;
    }
    if let Some(rest) = token.strip_prefix('.') {
        return match rest.parse::<u32>() {
            Ok(n) if rest.chars().all(|c| c.is_ascii_digit()) => Token::Value(f64::from(n) + 0.5),
            _ => Token::Malformed,
        };
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return match token.parse::<u32>() {
            Ok(n) => Token::Value(f64::from(n)),
            Err(_) => Token::Malformed,
        };
    }
    Token::Malformed
}

/// Number of digits in the integer part of a value.
fn digit_width(n: u32) -> u32 {
    let mut width = 1;
    let mut n = n / 10;
    while n > 0 {
        width += 1;
        n /= 10;
    }
    width
}

/// Classify a parsed score against the rubric maximum for its slot.
///
/// The decision compares digit widths of the integer parts:
/// a score with the same width as the maximum and strictly below it is
/// complete (no appended digit could stay in bounds); a narrower score is
/// ambiguous exactly when scaling it up to the maximum's width with zeros
/// still fits under the maximum.
pub fn classify(score: f64, max: u32) -> Classification {
    let max_f = f64::from(max);
    if score > max_f {
        return Classification::Invalid;
    }

    let width_score = digit_width(score.trunc() as u32);
    let width_max = digit_width(max);

    if width_score > width_max {
        return Classification::Invalid;
    }
    if width_score == width_max && score < max_f {
        return Classification::Complete;
    }
    if width_score < width_max {
        let scaled = score * 10f64.powi((width_max - width_score) as i32);
        if scaled <= max_f {
            return Classification::Continue;
        }
        return Classification::Complete;
    }

    // Same width and score == max.
    Classification::Complete
}

/// Canonical textual form of a finalized score: "7" or "7.5".
pub fn canonical(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as u32)
    } else {
        format!("{:.1}", score)
    }
}
