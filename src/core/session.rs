//! Grading session state machine for tally.
//!
//! The session owns the current input mode and typing buffers, consumes
//! one key event at a time, and emits display effects for the terminal
//! frontend. It consults the score validator and name matcher on the way,
//! and touches the record book and snapshot store only at commit time.
//!
//! Mode flow: `Rubric` (bootstrap only) → `Name` → `Grade` → `Name` after
//! each commit; `Command` overlays `Name` or `Grade` and returns to it;
//! `Done` is reached when the remaining set empties.

use crate::config::Config;
use crate::core::bonus::{self, Modifier};
use crate::core::matcher::{self, MIN_QUERY_LEN};
use crate::core::state::{Mode, PriorMode, SessionState};
use crate::core::validator::{self, Classification, Token};
use crate::error::Result;
use crate::roster::Roster;
use crate::storage::{Snapshot, SnapshotStore};

/// One keyboard input event, as delivered by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    Enter,
    Backspace,
    /// Ctrl-C or an equivalent interrupt.
    Interrupt,
}

/// A display instruction for the frontend renderer.
///
/// The session never writes to the terminal itself; each event produces a
/// list of these and the frontend applies them to its screen rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace the name row with this text.
    NameLine(String),
    /// Replace the rubric row with this text.
    RubricLine(String),
    /// Replace the grade row with this text.
    GradeLine { text: String, emphasis: bool },
    /// Replace the candidate list; an empty list clears it.
    Matches(Vec<String>),
    /// Replace the status row; an empty string clears it.
    Status(String),
    /// Audible error signal.
    Beep,
}

/// What the event loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading events.
    Continue,
    /// Every student is graded; export the report and exit.
    Done,
    /// Operator abort (`*`): snapshot flushed, no report.
    Aborted,
    /// Interrupt: snapshot flushed, report expected from the caller.
    Interrupted,
    /// Destructive reset (`!!`): snapshot deleted, relaunch required.
    Swiped,
}

/// Interactive grading session over a roster.
pub struct GradingSession<'a, S: SnapshotStore> {
    subject: String,
    roster: &'a Roster,
    store: &'a S,
    snapshot_every: u32,
    state: SessionState,
    recovered: Option<usize>,
}

impl<'a, S: SnapshotStore> GradingSession<'a, S> {
    /// Create a session for a subject, resuming from a snapshot when one
    /// exists.
    ///
    /// A recovered snapshot fully replaces the rubric, remaining set,
    /// records, and modifiers, and the session starts in `Name` mode
    /// instead of prompting for a rubric.
    pub fn new(
        subject: impl Into<String>,
        roster: &'a Roster,
        store: &'a S,
        config: &Config,
    ) -> Result<Self> {
        let subject = subject.into();
        let mut state = SessionState::new(roster.len());
        let mut recovered = None;

        if let Some(snapshot) = store.load(&subject)? {
            state.rubric = snapshot.rubric;
            state.remaining = snapshot.remaining;
            state.records = snapshot.records;
            state.modifiers = snapshot.modifiers;
            // A snapshot of a finished session has nothing left to grade.
            state.mode = if state.remaining.is_empty() {
                Mode::Done
            } else {
                Mode::Name
            };
            recovered = Some(state.records.len());
        }

        Ok(Self {
            subject,
            roster,
            store,
            snapshot_every: config.snapshot.every.max(1),
            state,
            recovered,
        })
    }

    /// The session's subject name.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Read-only view of the session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether the session still needs a rubric before the main loop.
    pub fn needs_rubric(&self) -> bool {
        self.state.mode == Mode::Rubric
    }

    /// Submit the rubric line typed at the bootstrap prompt.
    ///
    /// Accepts one line of whitespace-separated positive integers; any
    /// other token rejects the whole line so the caller re-prompts.
    pub fn submit_rubric_line(&mut self, line: &str) -> bool {
        if self.state.mode != Mode::Rubric {
            return false;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return false;
        }

        let mut rubric = Vec::with_capacity(tokens.len());
        for token in tokens {
            if !token.chars().all(|c| c.is_ascii_digit()) {
                return false;
            }
            match token.parse::<u32>() {
                Ok(max) if max > 0 => rubric.push(max),
                _ => return false,
            }
        }

        self.state.rubric = rubric;
        self.state.mode = Mode::Name;
        true
    }

    /// Effects that paint the initial screen after bootstrap.
    pub fn bootstrap_effects(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::RubricLine(self.rubric_line())];
        if let Some(count) = self.recovered {
            if count > 0 {
                effects.push(Effect::Status(format!(
                    "[CACHE] {} entries recovered from local cache. (!! to swipe)",
                    count
                )));
            }
        }
        effects.push(Effect::NameLine(self.name_line()));
        effects
    }

    /// Flush the current resume tuple to the snapshot store.
    pub fn flush(&self) -> Result<()> {
        self.write_snapshot()
    }

    // =========================================================================
    // Event dispatch
    // =========================================================================

    /// Process one key event.
    ///
    /// Returns the resulting control flow and the display effects to apply.
    /// Errors are only possible on the commit/flush paths: a failed
    /// snapshot write is fatal.
    pub fn handle_key(&mut self, key: Key) -> Result<(Flow, Vec<Effect>)> {
        if key == Key::Interrupt {
            self.flush()?;
            return Ok((Flow::Interrupted, Vec::new()));
        }

        match self.state.mode {
            Mode::Rubric | Mode::Done => Ok((Flow::Continue, Vec::new())),
            Mode::Command { prior } => self.command_key(prior, key),
            Mode::Name => {
                if let Some(handled) = self.global_key(key)? {
                    return Ok(handled);
                }
                Ok((Flow::Continue, self.name_key(key)))
            }
            Mode::Grade => {
                if let Some(handled) = self.global_key(key)? {
                    return Ok(handled);
                }
                self.grade_key(key)
            }
        }
    }

    /// Keys handled identically in `Name` and `Grade` mode: the session
    /// abort and the command-prefix characters.
    fn global_key(&mut self, key: Key) -> Result<Option<(Flow, Vec<Effect>)>> {
        let Key::Char(c) = key else {
            return Ok(None);
        };

        if c == '*' {
            self.flush()?;
            return Ok(Some((Flow::Aborted, Vec::new())));
        }

        if matches!(c, '!' | '+' | '-') {
            return Ok(Some(self.enter_command(c)));
        }

        Ok(None)
    }

    // =========================================================================
    // Name mode
    // =========================================================================

    fn name_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Backspace => {
                self.state.buffer.pop();
                let mut effects = vec![Effect::NameLine(self.name_line())];
                effects.extend(self.refresh_matches());
                effects
            }
            Key::Enter => {
                if self.state.matches.is_empty() {
                    Vec::new()
                } else {
                    self.select_match(0)
                }
            }
            Key::Char(c) if c.is_ascii_digit() => {
                let position = (c as u8 - b'0') as usize;
                if position >= 1 && position <= self.state.matches.len() {
                    self.select_match(position - 1)
                } else {
                    Vec::new()
                }
            }
            Key::Char(c) if c.is_ascii_alphabetic() || c == '\'' || c == ' ' => {
                self.state.buffer.push(c);
                let mut effects = vec![Effect::NameLine(self.name_line())];
                effects.extend(self.refresh_matches());
                effects
            }
            _ => Vec::new(),
        }
    }

    /// Re-run the name search, or clear the list under the threshold.
    fn refresh_matches(&mut self) -> Vec<Effect> {
        if self.state.buffer.len() >= MIN_QUERY_LEN {
            self.state.matches =
                matcher::search(&self.state.buffer, &self.state.remaining, self.roster);
        } else {
            self.state.matches.clear();
        }

        let lines = self
            .state
            .matches
            .iter()
            .enumerate()
            .map(|(i, &idx)| format!("{}. {}", i + 1, self.roster.name(idx)))
            .collect();
        vec![Effect::Matches(lines)]
    }

    /// Select the match at `position`, fix the name row to the full name,
    /// and move to `Grade` mode.
    fn select_match(&mut self, position: usize) -> Vec<Effect> {
        let idx = self.state.matches[position];
        self.state.selected = Some(idx);
        self.state.buffer.clear();
        self.state.matches.clear();
        self.state.mode = Mode::Grade;

        vec![
            Effect::NameLine(format!("NAME: {}", self.roster.name(idx))),
            Effect::Matches(Vec::new()),
            Effect::GradeLine {
                text: self.grade_line(),
                emphasis: false,
            },
        ]
    }

    // =========================================================================
    // Grade mode
    // =========================================================================

    fn grade_key(&mut self, key: Key) -> Result<(Flow, Vec<Effect>)> {
        if key == Key::Enter {
            return self.try_commit();
        }

        match key {
            Key::Backspace => {
                if let Some(popped) = self.state.buffer.pop() {
                    if popped == ' ' {
                        // Removing a separator removes the whole previous
                        // field, not just the space.
                        while let Some(last) = self.state.buffer.chars().last() {
                            if last == ' ' {
                                break;
                            }
                            self.state.buffer.pop();
                        }
                    }
                }
            }
            Key::Char(c) if c.is_ascii_digit() => {
                self.state.buffer.push(c);
            }
            Key::Char('.') => {
                if self.current_token_is_empty() {
                    self.state.buffer.push('.');
                }
            }
            Key::Char(' ') => {
                let after_digit = self
                    .state
                    .buffer
                    .chars()
                    .last()
                    .is_some_and(|c| c.is_ascii_digit());
                if after_digit {
                    self.state.buffer.push(' ');
                }
            }
            _ => {}
        }

        let mut effects = self.revalidate();
        effects.push(Effect::GradeLine {
            text: self.grade_line(),
            emphasis: false,
        });
        Ok((Flow::Continue, effects))
    }

    /// Classify the trailing token after a buffer mutation.
    ///
    /// Invalid tokens are popped wholesale with a beep; Complete tokens are
    /// normalized to their canonical form and a separator appended so the
    /// next keystroke starts the following slot.
    fn revalidate(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();

        let tokens: Vec<String> = self.state.buffer.split(' ').map(String::from).collect();
        if tokens.len() > self.state.rubric.len() {
            self.state.buffer.pop();
            return effects;
        }

        let Some(last) = tokens.last() else {
            return effects;
        };
        let slot = tokens.len() - 1;

        match validator::parse_token(last) {
            Token::Empty | Token::Pending => {}
            Token::Malformed => {
                self.pop_chars(last.len());
            }
            Token::Value(score) => match validator::classify(score, self.state.rubric[slot]) {
                Classification::Invalid => {
                    self.pop_chars(last.len());
                    effects.push(Effect::Beep);
                }
                Classification::Continue => {}
                Classification::Complete => {
                    self.pop_chars(last.len());
                    self.state.buffer.push_str(&validator::canonical(score));
                    self.state.buffer.push(' ');
                }
            },
        }

        effects
    }

    /// Commit the buffered grades when exactly one value per rubric slot
    /// has been typed; otherwise ignore the enter key.
    fn try_commit(&mut self) -> Result<(Flow, Vec<Effect>)> {
        let tokens: Vec<&str> = self
            .state
            .buffer
            .split(' ')
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() != self.state.rubric.len() {
            return Ok((Flow::Continue, Vec::new()));
        }

        let mut scores = Vec::with_capacity(tokens.len());
        for token in &tokens {
            match validator::parse_token(token) {
                Token::Value(score) => scores.push(score),
                _ => return Ok((Flow::Continue, Vec::new())),
            }
        }

        let raw_sum: f64 = scores.iter().sum();
        let selected = self.state.selected;
        let modifier = selected.and_then(|idx| self.state.modifiers.get(&idx)).copied();
        let adjusted = bonus::adjusted_total(raw_sum, modifier.as_ref(), self.state.max_total());

        let mut effects = vec![Effect::GradeLine {
            text: format!(
                "{}TOTAL: {}/{}",
                self.grade_line(),
                adjusted,
                self.state.max_total()
            ),
            emphasis: true,
        }];

        if self.state.record(selected, scores, self.roster.len()) {
            if let Some(idx) = selected {
                effects.push(Effect::Status(format!(
                    "[RECORDED] {}: {}/{} // [{}/{}]",
                    self.roster.name(idx),
                    adjusted,
                    self.state.max_total(),
                    self.state.records.len(),
                    self.roster.len()
                )));
            }
            self.amortized_snapshot()?;
        }

        self.state.selected = None;
        self.state.buffer.clear();
        self.state.matches.clear();

        if self.state.all_graded() {
            self.state.mode = Mode::Done;
            return Ok((Flow::Done, effects));
        }

        self.state.mode = Mode::Name;
        effects.push(Effect::NameLine(self.name_line()));
        effects.push(Effect::Matches(Vec::new()));
        Ok((Flow::Continue, effects))
    }

    // =========================================================================
    // Command overlay
    // =========================================================================

    /// Enter the command overlay; the prefix character is the first
    /// character of the command text.
    fn enter_command(&mut self, prefix: char) -> (Flow, Vec<Effect>) {
        let prior = if self.state.mode == Mode::Grade {
            PriorMode::Grade
        } else {
            PriorMode::Name
        };

        self.state.command.clear();
        self.state.command.push(prefix);
        self.state.mode = Mode::Command { prior };

        (
            Flow::Continue,
            vec![Effect::Status(format!(
                "[COMMAND]: {}",
                self.state.command
            ))],
        )
    }

    fn command_key(&mut self, prior: PriorMode, key: Key) -> Result<(Flow, Vec<Effect>)> {
        match key {
            Key::Backspace => {
                self.state.command.pop();
                if self.state.command.is_empty() {
                    return Ok((Flow::Continue, self.restore_prior(prior, None)));
                }
                Ok((
                    Flow::Continue,
                    vec![Effect::Status(format!(
                        "[COMMAND]: {}",
                        self.state.command
                    ))],
                ))
            }
            Key::Enter => self.execute_command(prior),
            Key::Char(c) if c.is_ascii_graphic() || c == ' ' => {
                self.state.command.push(c);
                Ok((
                    Flow::Continue,
                    vec![Effect::Status(format!(
                        "[COMMAND]: {}",
                        self.state.command
                    ))],
                ))
            }
            _ => Ok((Flow::Continue, Vec::new())),
        }
    }

    fn execute_command(&mut self, prior: PriorMode) -> Result<(Flow, Vec<Effect>)> {
        let text = std::mem::take(&mut self.state.command);

        if text == "!!" {
            // Destructive reset: wipe the snapshot and end the session so
            // the operator relaunches with a fresh rubric.
            self.store.delete(&self.subject)?;
            self.state.rubric.clear();
            self.state.records.clear();
            self.state.modifiers.clear();
            self.state.remaining = self.roster.all_indices();
            self.state.mode = Mode::Done;
            return Ok((Flow::Swiped, Vec::new()));
        }

        if let Some(modifier) = Modifier::parse(&text) {
            if prior == PriorMode::Grade {
                if let Some(idx) = self.state.selected {
                    self.state.modifiers.insert(idx, modifier);
                    let status = format!("[BOP] {}: {}", self.roster.name(idx), modifier);
                    return Ok((Flow::Continue, self.restore_prior(prior, Some(status))));
                }
            }
        }

        // Anything else is discarded silently.
        Ok((Flow::Continue, self.restore_prior(prior, None)))
    }

    /// Leave the overlay and repaint the row of the restored mode.
    fn restore_prior(&mut self, prior: PriorMode, status: Option<String>) -> Vec<Effect> {
        self.state.command.clear();

        let mut effects = Vec::new();
        match prior {
            PriorMode::Name => {
                self.state.mode = Mode::Name;
                effects.push(Effect::NameLine(self.name_line()));
            }
            PriorMode::Grade => {
                self.state.mode = Mode::Grade;
                effects.push(Effect::GradeLine {
                    text: self.grade_line(),
                    emphasis: false,
                });
            }
        }
        effects.push(Effect::Status(status.unwrap_or_default()));
        effects
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Snapshot every `snapshot_every` committed records.
    fn amortized_snapshot(&self) -> Result<()> {
        if self.state.records.len() as u32 % self.snapshot_every == 0 {
            self.write_snapshot()?;
        }
        Ok(())
    }

    fn write_snapshot(&self) -> Result<()> {
        let snapshot = Snapshot::new(
            self.state.rubric.clone(),
            self.state.remaining.clone(),
            self.state.records.clone(),
            self.state.modifiers.clone(),
        );
        self.store.save(&self.subject, &snapshot)
    }

    // =========================================================================
    // Row formatting
    // =========================================================================

    fn name_line(&self) -> String {
        format!("NAME: {}", self.state.buffer)
    }

    fn rubric_line(&self) -> String {
        let padded: String = self
            .state
            .rubric
            .iter()
            .map(|max| format!("{:<width$}", max, width = column_width(*max)))
            .collect();
        format!("RUBRIC: {}", padded.trim_end())
    }

    /// The grade row, with each finished token padded to its question's
    /// column so scores line up under the rubric display.
    fn grade_line(&self) -> String {
        let tokens: Vec<&str> = self.state.buffer.split(' ').collect();
        let mut line = String::from("GRADE:  ");
        for (i, token) in tokens.iter().enumerate() {
            if i + 1 < tokens.len() {
                let width = self
                    .state
                    .rubric
                    .get(i)
                    .map(|max| column_width(*max))
                    .unwrap_or(token.len() + 1);
                line.push_str(&format!("{:<width$}", token, width = width));
            } else {
                line.push_str(token);
            }
        }
        line
    }

    fn current_token_is_empty(&self) -> bool {
        self.state.buffer.chars().last().map_or(true, |c| c == ' ')
    }

    fn pop_chars(&mut self, count: usize) {
        for _ in 0..count {
            self.state.buffer.pop();
        }
    }
}

/// Display column width for a rubric maximum.
fn column_width(max: u32) -> usize {
    max.to_string().len() + 3
}
