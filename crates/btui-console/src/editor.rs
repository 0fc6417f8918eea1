#![forbid(unsafe_code)]

//! In-place value editing.
//!
//! An [`InplaceEditor`] runs as a nested session drawn over a single menu
//! value cell: the parent menu stays on screen, the edited cell is
//! highlighted with a blinking cursor, and every keystroke is validated
//! against a [`Grammar`] before it lands. [`FramedInput`] is the same
//! field hosted in its own small dialog frame for prompts that have no
//! menu cell to live in.
//!
//! # Design Notes
//!
//! - Grammars validate prefixes, not results. A byte is accepted only if
//!   the grown text could still become a valid value, so the field never
//!   displays something the parser would refuse for shape. Range checks
//!   happen after accept, in [`input_value_in_range`].
//! - The editor exits with [`ACCEPTED`] or [`CANCELLED`]; the caller maps
//!   that onto its own state and repaints the cell.

use std::io;
use std::time::Duration;

use btui_core::event::{KeyCode, KeyEvent, control};
use btui_core::geometry::Anchor;
use btui_core::style::TextStyle;
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::console::Console;
use crate::event_loop::run;
use crate::frame::Frame;
use crate::session::{DEFAULT_TIMER_PERIOD, Flow, Session};

/// Exit code of an editor session that accepted a value.
pub const ACCEPTED: i32 = 1;

/// Exit code of an editor session that was cancelled.
pub const CANCELLED: i32 = 0;

/// How long the cancellation flash stays on screen.
const CANCEL_DWELL: Duration = Duration::from_millis(750);

/// Shape constraint applied to a field, one keystroke at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Any printable ASCII.
    Text,
    /// A decimal natural number with no leading zero (lone `0` is fine).
    Natural,
    /// An optionally negative decimal integer. `-0` and leading zeros
    /// are rejected.
    Integer,
    /// A decimal number with an optional fraction and sign.
    Float,
    /// [`Grammar::Float`] without the sign.
    PositiveFloat,
}

impl Grammar {
    /// Would appending `byte` to `current` still leave a viable value?
    #[must_use]
    pub fn accepts(self, current: &str, byte: u8) -> bool {
        if !(0x20..=0x7E).contains(&byte) {
            return false;
        }
        let ch = byte as char;
        match self {
            Grammar::Text => true,
            Grammar::Natural => ch.is_ascii_digit() && !current.starts_with('0'),
            Grammar::Integer => match current {
                "" => ch == '-' || ch.is_ascii_digit(),
                "-" => ch.is_ascii_digit() && ch != '0',
                "0" => false,
                _ => ch.is_ascii_digit(),
            },
            Grammar::Float | Grammar::PositiveFloat => match current {
                "" => {
                    ch.is_ascii_digit() || ch == '.' || (self == Grammar::Float && ch == '-')
                }
                "-" => ch.is_ascii_digit() || ch == '.',
                "0" | "-0" => ch == '.',
                _ => {
                    if ch == '.' {
                        !current.contains('.')
                    } else {
                        ch.is_ascii_digit()
                    }
                }
            },
        }
    }
}

/// What a keystroke did to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldAction {
    /// The text changed; repaint the field.
    Edited,
    /// Nothing changed; first presses get a bell.
    Rejected,
    /// Enter on the current text.
    Accept,
    /// The edit was abandoned.
    Cancel,
}

/// The field itself: text, capacity, grammar and cursor blink phase.
/// Shared between the in-place and the framed editor.
#[derive(Debug)]
struct Field {
    value: String,
    max_len: u16,
    grammar: Grammar,
    blink_on: bool,
    blink_ticks: u32,
    blink_period_ticks: u32,
}

impl Field {
    fn new(grammar: Grammar, max_len: u16, timer_period: Duration) -> Self {
        // One full blink per second regardless of the host's tick rate.
        let per_second =
            Duration::from_secs(1).as_micros() / timer_period.as_micros().max(1);
        Self {
            value: String::new(),
            max_len,
            grammar,
            blink_on: false,
            blink_ticks: 0,
            blink_period_ticks: (per_second as u32).max(1),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> FieldAction {
        match key.code {
            KeyCode::Delete
            | KeyCode::Byte(control::BACKSPACE)
            | KeyCode::Byte(control::DEL) => {
                if self.value.pop().is_some() {
                    FieldAction::Edited
                } else {
                    FieldAction::Rejected
                }
            }
            KeyCode::Byte(control::CLEAR_FIELD) => {
                self.value.clear();
                FieldAction::Edited
            }
            KeyCode::Byte(control::ENTER) | KeyCode::Byte(control::LINE_FEED) => {
                FieldAction::Accept
            }
            KeyCode::Byte(control::CANCEL)
            | KeyCode::Byte(control::END_OF_INPUT)
            | KeyCode::Byte(control::ESC) => FieldAction::Cancel,
            KeyCode::Byte(byte) => {
                if usize::from(self.max_len) > self.value.len()
                    && self.grammar.accepts(&self.value, byte)
                {
                    self.value.push(byte as char);
                    FieldAction::Edited
                } else {
                    FieldAction::Rejected
                }
            }
            _ => FieldAction::Rejected,
        }
    }

    /// Advance the blink divider; true when the phase flipped.
    fn tick_blink(&mut self) -> bool {
        self.blink_ticks += 1;
        if self.blink_ticks >= self.blink_period_ticks {
            self.blink_ticks = 0;
            self.blink_on = !self.blink_on;
            true
        } else {
            false
        }
    }

    /// The full field as displayed: text, blinking cursor cell, then
    /// underscore padding out to capacity.
    fn render(&self) -> String {
        let mut s = self.value.clone();
        let len = self.value.len() as u16;
        for pos in len..self.max_len {
            s.push(if pos == len && self.blink_on { ' ' } else { '_' });
        }
        s
    }

    fn draw(&self, console: &mut Console<'_>, row: u16, col: u16) -> io::Result<()> {
        console.move_to(row, col)?;
        console.put_styled(&self.render(), TextStyle::INVERSE, self.max_len, false)
    }

    /// Repaint only the cursor cell after a blink phase flip.
    fn draw_cursor(&self, console: &mut Console<'_>, row: u16, col: u16) -> io::Result<()> {
        let len = self.value.len() as u16;
        if len >= self.max_len {
            return Ok(());
        }
        console.move_to(row, col + len)?;
        let glyph = if self.blink_on { " " } else { "_" };
        console.put_styled(glyph, TextStyle::INVERSE, 1, false)
    }

    /// Flash the whole field as a run of `X`.
    fn draw_cancelled(&self, console: &mut Console<'_>, row: u16, col: u16) -> io::Result<()> {
        console.move_to(row, col)?;
        let flash = "X".repeat(usize::from(self.max_len));
        console.put_styled(&flash, TextStyle::INVERSE, self.max_len, false)
    }

    /// Map a keystroke onto the session flow, repainting as needed.
    fn on_key(
        &mut self,
        console: &mut Console<'_>,
        row: u16,
        col: u16,
        key: KeyEvent,
    ) -> io::Result<Flow> {
        match self.handle_key(key) {
            FieldAction::Edited => {
                self.draw(console, row, col)?;
                Ok(Flow::Continue)
            }
            FieldAction::Rejected => {
                if key.is_first() {
                    console.beep()?;
                }
                Ok(Flow::Continue)
            }
            FieldAction::Accept => Ok(Flow::Exit(ACCEPTED)),
            FieldAction::Cancel => Ok(Flow::Exit(CANCELLED)),
        }
    }
}

/// An editor drawn over a value cell of the session below it.
///
/// Runs nested: the parent's screen stays up, its timer keeps being
/// forwarded, and when the editor exits the parent repaints the cell
/// from its own state.
pub struct InplaceEditor<'a> {
    parent: Option<&'a mut dyn Session>,
    item: Option<usize>,
    row: u16,
    col: u16,
    period: Duration,
    field: Field,
    drawn_once: bool,
}

impl<'a> InplaceEditor<'a> {
    /// An editor at a fixed screen cell, with no session underneath.
    #[must_use]
    pub fn at(row: u16, col: u16, max_len: u16, grammar: Grammar) -> Self {
        Self {
            parent: None,
            item: None,
            row,
            col,
            period: DEFAULT_TIMER_PERIOD,
            field: Field::new(grammar, max_len, DEFAULT_TIMER_PERIOD),
            drawn_once: false,
        }
    }

    /// An editor over `parent`'s value cell for `item`.
    ///
    /// The cell is resolved through [`Session::value_cell`] now and again
    /// after every parent repaint, so a mid-edit resize keeps the field
    /// on the right cell. The parent's timer period is inherited.
    #[must_use]
    pub fn over_item(parent: &'a mut dyn Session, item: usize, max_len: u16, grammar: Grammar) -> Self {
        let period = parent.timer_period();
        let (row, col) = parent.value_cell(item).unwrap_or((0, 0));
        Self {
            parent: Some(parent),
            item: Some(item),
            row,
            col,
            period,
            field: Field::new(grammar, max_len, period),
            drawn_once: false,
        }
    }

    /// Text accepted so far.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.field.value
    }

    /// Consume the editor, keeping the text.
    #[must_use]
    pub fn into_value(self) -> String {
        self.field.value
    }

    /// Flash the field as cancelled and hold it on screen briefly.
    pub fn cancelled(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        self.resolve_cell();
        self.field.draw_cancelled(console, self.row, self.col)?;
        console.flush()?;
        console.sleep(CANCEL_DWELL);
        Ok(())
    }

    fn resolve_cell(&mut self) {
        if let (Some(parent), Some(item)) = (&self.parent, self.item) {
            if let Some((row, col)) = parent.value_cell(item) {
                self.row = row;
                self.col = col;
            }
        }
    }
}

impl Session for InplaceEditor<'_> {
    fn timer_period(&self) -> Duration {
        self.period
    }

    fn redraw(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        // The parent already has the screen up when the editor opens; it
        // only repaints underneath us from the second redraw on.
        if self.drawn_once {
            if let Some(parent) = &mut self.parent {
                parent.redraw(console)?;
            }
        }
        self.drawn_once = true;
        self.resolve_cell();
        self.field.draw(console, self.row, self.col)
    }

    fn on_key(
        &mut self,
        console: &mut Console<'_>,
        key: KeyEvent,
        _params: &[String],
    ) -> io::Result<Flow> {
        self.field.on_key(console, self.row, self.col, key)
    }

    fn on_disconnect(&mut self, _console: &mut Console<'_>) -> io::Result<Flow> {
        Ok(Flow::Exit(CANCELLED))
    }

    fn on_timer(&mut self, console: &mut Console<'_>, connected: bool) -> io::Result<Flow> {
        if self.field.tick_blink() && connected {
            self.field.draw_cursor(console, self.row, self.col)?;
        }
        if let Some(parent) = &mut self.parent {
            // The parent's loop is parked while we run; keep its periodic
            // work alive through ours.
            return parent.on_timer(console, connected);
        }
        Ok(Flow::Continue)
    }
}

/// A field in its own centered dialog frame.
pub struct FramedInput {
    frame: Frame,
    prompt: String,
    field: Field,
    row: u16,
    col: u16,
}

impl FramedInput {
    /// A dialog titled `title` with `prompt` before the field.
    ///
    /// The frame is 7 rows tall and grows from its 40-column minimum to
    /// fit the prompt and the field.
    #[must_use]
    pub fn new(title: &str, prompt: &str, max_len: u16, grammar: Grammar) -> Self {
        let width = 40u16
            .max(title.width() as u16 + 6)
            .max(prompt.width() as u16 + max_len + 7);
        Self {
            frame: Frame::new(Some(title), 7, width, Anchor::Center)
                .with_clear_on_redraw(false),
            prompt: prompt.to_owned(),
            field: Field::new(grammar, max_len, DEFAULT_TIMER_PERIOD),
            row: 0,
            col: 0,
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.field.value
    }

    #[must_use]
    pub fn into_value(self) -> String {
        self.field.value
    }

    /// Flash a centered `CANCELLED` banner across the field row.
    pub fn cancelled(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        let rect = self.frame.rect();
        if rect.width < 6 {
            return Ok(());
        }
        console.move_to(rect.row + 4, rect.col + 3)?;
        console.save_cursor()?;
        console.set_style(TextStyle::INVERSE)?;
        console.put_centered("  CANCELLED  ", rect.width - 6, 'X')?;
        console.restore_cursor()?;
        console.flush()?;
        console.sleep(CANCEL_DWELL);
        Ok(())
    }
}

impl Session for FramedInput {
    fn redraw(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        let rect = self.frame.draw(console)?;
        self.row = rect.row + 4;
        console.move_to(self.row, rect.col + 3)?;
        console.put(&self.prompt)?;
        self.col = rect.col + 3 + self.prompt.width() as u16 + 1;
        self.field.draw(console, self.row, self.col)
    }

    fn on_key(
        &mut self,
        console: &mut Console<'_>,
        key: KeyEvent,
        _params: &[String],
    ) -> io::Result<Flow> {
        self.field.on_key(console, self.row, self.col, key)
    }

    fn on_disconnect(&mut self, _console: &mut Console<'_>) -> io::Result<Flow> {
        Ok(Flow::Exit(CANCELLED))
    }

    fn on_timer(&mut self, console: &mut Console<'_>, connected: bool) -> io::Result<Flow> {
        if self.field.tick_blink() && connected {
            self.field.draw_cursor(console, self.row, self.col)?;
        }
        Ok(Flow::Continue)
    }
}

/// Edit `parent`'s value cell for `item` and parse the result as an
/// integer within `min..=max`.
///
/// The field width and grammar come from the bounds. Out-of-range or
/// unparseable input gets a bell and the cancellation flash; a plain
/// cancel just gets the flash. Either way `None` is returned and the
/// caller repaints the cell.
pub fn input_value_in_range(
    console: &mut Console<'_>,
    parent: &mut dyn Session,
    item: usize,
    min: i32,
    max: i32,
) -> io::Result<Option<i32>> {
    let grammar = if min < 0 {
        Grammar::Integer
    } else {
        Grammar::Natural
    };
    let width = decimal_width(min).max(decimal_width(max));
    let mut editor = InplaceEditor::over_item(parent, item, width, grammar);
    let code = run(console, &mut editor)?;
    if code == ACCEPTED && !editor.value().is_empty() {
        if let Ok(value) = editor.value().parse::<i32>() {
            if (min..=max).contains(&value) {
                debug!(value, "input accepted");
                return Ok(Some(value));
            }
        }
        debug!(input = editor.value(), min, max, "input out of range");
        console.beep()?;
    }
    editor.cancelled(console)?;
    Ok(None)
}

/// Columns needed to type `value` in decimal, sign included.
fn decimal_width(value: i32) -> u16 {
    let digits = match value.checked_abs() {
        Some(0) => 1,
        Some(magnitude) => magnitude.ilog10() as u16 + 1,
        None => 10,
    };
    digits + u16::from(value < 0)
}
