//! Terminal frontend for the grading session.
//!
//! The screen is line-oriented: name prompt, rubric, grade entry, the
//! candidate list, and a status row at the bottom of the terminal. The
//! state machine decides what every row says; this module only paints
//! rows and feeds key events back in. Raw mode is enabled for the
//! duration of the loop and restored on drop, including on panic paths.

use std::io::{self, Stdout, Write};

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType};
use crossterm::{execute, queue};

use crate::core::session::{Effect, Flow, GradingSession, Key};
use crate::core::state::Mode;
use crate::error::{Result, TallyError};
use crate::storage::SnapshotStore;

const ROW_NAME: u16 = 0;
const ROW_RUBRIC: u16 = 1;
const ROW_GRADE: u16 = 2;
const ROW_LIST: u16 = 3;

/// Prompt for the rubric on plain stdin, before raw mode starts.
///
/// Re-prompts until the session accepts the line.
pub fn prompt_rubric<S: SnapshotStore>(session: &mut GradingSession<'_, S>) -> Result<()> {
    let stdin = io::stdin();
    loop {
        print!("RUBRIC: ");
        io::stdout().flush().map_err(TallyError::terminal)?;

        let mut line = String::new();
        let read = stdin.read_line(&mut line).map_err(TallyError::terminal)?;
        if read == 0 {
            return Err(TallyError::rubric("no rubric entered (stdin closed)"));
        }

        if session.submit_rubric_line(&line) {
            return Ok(());
        }
    }
}

/// Run the interactive loop until the session ends.
pub fn run<S: SnapshotStore>(session: &mut GradingSession<'_, S>) -> Result<Flow> {
    if session.state().mode.is_terminal() {
        return Ok(Flow::Done);
    }

    let mut screen = Screen::new()?;
    screen.apply(&session.bootstrap_effects())?;
    screen.place_cursor(session)?;

    loop {
        let Some(key) = read_key()? else {
            continue;
        };

        let (flow, effects) = session.handle_key(key)?;
        screen.apply(&effects)?;
        if flow != Flow::Continue {
            return Ok(flow);
        }
        screen.place_cursor(session)?;
    }
}

/// Block for the next key event and map it into the session's vocabulary.
fn read_key() -> Result<Option<Key>> {
    let event = event::read().map_err(TallyError::terminal)?;

    let Event::Key(key_event) = event else {
        return Ok(None);
    };
    if key_event.kind == KeyEventKind::Release {
        return Ok(None);
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        if key_event.code == KeyCode::Char('c') {
            return Ok(Some(Key::Interrupt));
        }
        return Ok(None);
    }

    Ok(match key_event.code {
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Backspace => Some(Key::Backspace),
        _ => None,
    })
}

/// Raw-mode screen with fixed row assignments.
struct Screen {
    out: Stdout,
    status_row: u16,
    match_rows: usize,
    name_len: u16,
    grade_len: u16,
    status_len: u16,
}

impl Screen {
    fn new() -> Result<Self> {
        enable_raw_mode().map_err(TallyError::terminal)?;

        let mut out = io::stdout();
        let (_, rows) = terminal::size().map_err(TallyError::terminal)?;
        execute!(out, Clear(ClearType::All), MoveTo(0, 0)).map_err(TallyError::terminal)?;

        Ok(Self {
            out,
            status_row: rows.saturating_sub(1),
            match_rows: 0,
            name_len: 0,
            grade_len: 0,
            status_len: 0,
        })
    }

    fn apply(&mut self, effects: &[Effect]) -> Result<()> {
        for effect in effects {
            self.apply_one(effect).map_err(TallyError::terminal)?;
        }
        self.out.flush().map_err(TallyError::terminal)
    }

    fn apply_one(&mut self, effect: &Effect) -> io::Result<()> {
        match effect {
            Effect::NameLine(text) => {
                self.name_len = text.len() as u16;
                self.set_row(ROW_NAME, text, Some(Color::Red))
            }
            Effect::RubricLine(text) => self.set_row(ROW_RUBRIC, text, Some(Color::Red)),
            Effect::GradeLine { text, emphasis } => {
                self.grade_len = text.len() as u16;
                let color = if *emphasis { Some(Color::Red) } else { None };
                self.set_row(ROW_GRADE, text, color)
            }
            Effect::Matches(lines) => {
                let to_clear = self.match_rows.max(lines.len());
                for i in 0..to_clear {
                    let row = ROW_LIST + i as u16;
                    queue!(self.out, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
                    if let Some(line) = lines.get(i) {
                        queue!(
                            self.out,
                            SetForegroundColor(Color::Yellow),
                            Print(line),
                            ResetColor
                        )?;
                    }
                }
                self.match_rows = lines.len();
                Ok(())
            }
            Effect::Status(text) => {
                self.status_len = text.len() as u16;
                self.set_row(self.status_row, text, Some(Color::Yellow))
            }
            Effect::Beep => queue!(self.out, Print("\x07")),
        }
    }

    fn set_row(&mut self, row: u16, text: &str, color: Option<Color>) -> io::Result<()> {
        queue!(self.out, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
        match color {
            Some(color) => queue!(
                self.out,
                SetForegroundColor(color),
                Print(text),
                ResetColor
            ),
            None => queue!(self.out, Print(text)),
        }
    }

    /// Park the cursor at the end of whichever row is taking input.
    fn place_cursor<S: SnapshotStore>(&mut self, session: &GradingSession<'_, S>) -> Result<()> {
        let (row, col) = match session.state().mode {
            Mode::Grade => (ROW_GRADE, self.grade_len),
            Mode::Command { .. } => (self.status_row, self.status_len),
            _ => (ROW_NAME, self.name_len),
        };
        execute!(self.out, MoveTo(col, row)).map_err(TallyError::terminal)
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.out, MoveTo(0, self.status_row), Print("\r\n"));
    }
}
