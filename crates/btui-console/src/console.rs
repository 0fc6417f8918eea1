#![forbid(unsafe_code)]

//! Drawing context shared by every session.
//!
//! A [`Console`] borrows the [`ConsolePort`] for the duration of an event
//! loop and layers cursor-addressed drawing primitives on top of the raw
//! byte stream. It also carries the two pieces of state that belong to the
//! conversation with the terminal rather than to any one session: the
//! negotiated screen size and the next timer deadline.
//!
//! # Design Notes
//!
//! Output is unbuffered. Every primitive writes straight through to the
//! port so a session can interleave its own `write_all` calls with the
//! helpers here and nothing arrives out of order. Sequences that need
//! formatting are assembled in a small scratch buffer to keep per-call
//! allocations off the hot path.

use std::io;
use std::time::{Duration, Instant};

use btui_core::ansi;
use btui_core::geometry::{Rect, ScreenSize};
use btui_core::style::TextStyle;
use btui_port::ConsolePort;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Terminal drawing context handed to every session callback.
pub struct Console<'a> {
    port: &'a mut dyn ConsolePort,
    screen: ScreenSize,
    next_deadline: Instant,
    scratch: Vec<u8>,
}

impl<'a> Console<'a> {
    /// Wraps a port with the default 24x80 geometry.
    ///
    /// The event loop refines the geometry once the terminal answers a
    /// size query; until then all layout assumes the default.
    pub fn new(port: &'a mut dyn ConsolePort) -> Self {
        let next_deadline = port.now();
        Self {
            port,
            screen: ScreenSize::DEFAULT,
            next_deadline,
            scratch: Vec::new(),
        }
    }

    /// Most recently negotiated screen size.
    #[must_use]
    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    pub(crate) fn set_screen(&mut self, screen: ScreenSize) {
        self.screen = screen;
    }

    /// Current time as observed by the underlying port.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.port.now()
    }

    /// Deadline of the next scheduled timer callback.
    #[must_use]
    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    /// Reschedules the next timer callback.
    ///
    /// Handlers may push the deadline out (or pull it in) and the event
    /// loop picks the new value up when the handler returns.
    pub fn set_next_deadline(&mut self, deadline: Instant) {
        self.next_deadline = deadline;
    }

    /// Blocks the calling session for `duration`.
    ///
    /// Timer deadlines are not advanced while sleeping, so after a long
    /// sleep the loop fires catch-up ticks until the schedule is level
    /// again.
    pub fn sleep(&mut self, duration: Duration) {
        self.port.idle_sleep(duration);
    }

    pub(crate) fn is_connected(&mut self) -> bool {
        self.port.is_connected()
    }

    pub(crate) fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        self.port.read_byte(timeout)
    }

    pub(crate) fn trigger_watchdog_reset(&mut self) {
        self.port.trigger_watchdog_reset();
    }

    /// Writes raw bytes to the terminal.
    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)
    }

    /// Flushes buffered output down to the terminal.
    pub fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }

    /// Moves the cursor to a zero-based `(row, col)` cell.
    pub fn move_to(&mut self, row: u16, col: u16) -> io::Result<()> {
        self.scratch.clear();
        ansi::move_to(&mut self.scratch, row, col)?;
        self.port.write_all(&self.scratch)
    }

    /// Clears the screen and homes the cursor.
    pub fn clear_screen(&mut self) -> io::Result<()> {
        self.port.write_all(ansi::CLEAR_SCREEN)?;
        self.port.write_all(ansi::CURSOR_HOME)
    }

    pub fn show_cursor(&mut self) -> io::Result<()> {
        self.port.write_all(ansi::CURSOR_SHOW)
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        self.port.write_all(ansi::CURSOR_HIDE)
    }

    /// Saves the cursor position and text attributes (DECSC).
    pub fn save_cursor(&mut self) -> io::Result<()> {
        self.port.write_all(ansi::CURSOR_SAVE)
    }

    /// Restores the cursor position and text attributes (DECRC).
    pub fn restore_cursor(&mut self) -> io::Result<()> {
        self.port.write_all(ansi::CURSOR_RESTORE)
    }

    /// Applies a text style to subsequent output.
    pub fn set_style(&mut self, style: TextStyle) -> io::Result<()> {
        self.scratch.clear();
        style.write_sgr(&mut self.scratch)?;
        self.port.write_all(&self.scratch)
    }

    /// Rings the terminal bell immediately.
    pub fn beep(&mut self) -> io::Result<()> {
        self.port.write_all(ansi::BELL)?;
        self.port.flush()
    }

    /// Asks the terminal to report its size.
    ///
    /// The probe parks the cursor at an absurdly large cell and requests a
    /// cursor position report; the clamped reply is the screen size. The
    /// event loop consumes the report and updates [`Console::screen`].
    pub fn request_screen_size(&mut self) -> io::Result<()> {
        self.port.write_all(ansi::SIZE_PROBE)?;
        self.port.flush()
    }

    /// Writes a string at the current cursor position.
    pub fn put(&mut self, text: &str) -> io::Result<()> {
        self.port.write_all(text.as_bytes())
    }

    /// Writes at most `max` columns of `text`.
    ///
    /// With `fill` set the remainder of the budget is padded with spaces,
    /// which overwrites whatever a wider previous value left behind.
    pub fn put_clipped(&mut self, text: &str, max: u16, fill: bool) -> io::Result<()> {
        let max = usize::from(max);
        let mut used = 0;
        let mut end = 0;
        for (index, ch) in text.char_indices() {
            let width = ch.width().unwrap_or(0);
            if used + width > max {
                break;
            }
            used += width;
            end = index + ch.len_utf8();
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(text[..end].as_bytes());
        if fill {
            self.scratch.resize(self.scratch.len() + (max - used), b' ');
        }
        self.port.write_all(&self.scratch)
    }

    /// Centers `text` within `width` columns, padding both sides with
    /// `pad`. Text wider than the budget is clipped instead.
    pub fn put_centered(&mut self, text: &str, width: u16, pad: char) -> io::Result<()> {
        let text_width = text.width() as u16;
        if text_width >= width {
            return self.put_clipped(text, width, false);
        }
        let left = (width - text_width) / 2;
        self.scratch.clear();
        let mut buf = [0u8; 4];
        let pad = pad.encode_utf8(&mut buf).as_bytes();
        for _ in 0..left {
            self.scratch.extend_from_slice(pad);
        }
        self.scratch.extend_from_slice(text.as_bytes());
        for _ in left + text_width..width {
            self.scratch.extend_from_slice(pad);
        }
        self.port.write_all(&self.scratch)
    }

    /// Writes styled text without disturbing the surrounding attributes.
    ///
    /// Cursor position and attributes are saved before the style is
    /// applied and restored afterwards, so callers never leak highlight
    /// state into later output.
    pub fn put_styled(
        &mut self,
        text: &str,
        style: TextStyle,
        max: u16,
        fill: bool,
    ) -> io::Result<()> {
        self.save_cursor()?;
        self.set_style(style)?;
        self.put_clipped(text, max, fill)?;
        self.restore_cursor()
    }

    /// Draws a rectangular frame with `+` corners, `-` horizontals and
    /// `|` verticals. Interior cells are blanked with spaces, so the box
    /// is opaque over whatever was on screen beneath it. Rectangles
    /// thinner than the border itself are skipped.
    pub fn draw_box(&mut self, rect: Rect) -> io::Result<()> {
        if rect.height < 2 || rect.width < 2 {
            return Ok(());
        }
        self.scratch.clear();
        self.scratch.push(b'+');
        self.scratch
            .resize(self.scratch.len() + usize::from(rect.width - 2), b'-');
        self.scratch.push(b'+');
        let border = std::mem::take(&mut self.scratch);
        self.scratch.push(b'|');
        self.scratch
            .resize(self.scratch.len() + usize::from(rect.width - 2), b' ');
        self.scratch.push(b'|');
        let interior = std::mem::take(&mut self.scratch);

        self.move_to(rect.row, rect.col)?;
        self.port.write_all(&border)?;
        for row in rect.row + 1..rect.bottom() - 1 {
            self.move_to(row, rect.col)?;
            self.port.write_all(&interior)?;
        }
        self.move_to(rect.bottom() - 1, rect.col)?;
        self.port.write_all(&border)?;
        self.scratch = border;
        Ok(())
    }
}
