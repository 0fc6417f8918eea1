//! The session contract.
//!
//! A session owns one screenful of interaction: a menu, an input dialog,
//! the reboot interceptor. The event loop delivers decoded keys and timer
//! ticks to exactly one session at a time; opening a nested dialog means
//! running a second loop on a second session while the first one waits on
//! the stack.
//!
//! # Lifecycle Guarantees
//!
//! * `redraw` may be called at any time after the loop starts, and must
//!   repaint the whole screen from the session's own state.
//! * `on_connect` fires before the first `redraw` of a connection, and
//!   `on_disconnect` fires once per lost connection.
//! * `on_key` only fires while the terminal is connected; `on_timer`
//!   fires either way and is told which.
//!
//! Every callback can end the session by returning [`Flow::Exit`]; the
//! event loop hands the exit code to whoever started it.

use std::io;
use std::time::Duration;

use btui_core::event::KeyEvent;

use crate::console::Console;

/// Timer period used by sessions that do not override
/// [`Session::timer_period`].
pub const DEFAULT_TIMER_PERIOD: Duration = Duration::from_millis(10);

/// What the event loop should do after a session callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep the session running.
    Continue,
    /// Stop the loop and return this code to the caller.
    Exit(i32),
}

impl Flow {
    /// True when the flow ends the session.
    #[must_use]
    pub const fn is_exit(self) -> bool {
        matches!(self, Flow::Exit(_))
    }
}

/// One interactive screen driven by the event loop.
///
/// Implementations usually hold a [`crate::frame::Frame`] plus whatever
/// state the screen displays. All drawing goes through the [`Console`]
/// passed to each callback.
pub trait Session {
    /// How often `on_timer` should fire.
    ///
    /// The loop schedules ticks back to back from the previous deadline,
    /// so the average rate holds even when individual callbacks run long.
    fn timer_period(&self) -> Duration {
        DEFAULT_TIMER_PERIOD
    }

    /// Repaint the whole screen.
    ///
    /// Called after size negotiation, on `ctrl-l`, and whenever a nested
    /// session returns and left the display in an unknown state.
    fn redraw(&mut self, console: &mut Console<'_>) -> io::Result<()>;

    /// The terminal just connected (or was already connected when the
    /// loop started). Runs before the first redraw.
    fn on_connect(&mut self, _console: &mut Console<'_>) -> io::Result<Flow> {
        Ok(Flow::Continue)
    }

    /// The terminal went away. Sessions that cannot outlive their display
    /// return [`Flow::Exit`] here.
    fn on_disconnect(&mut self, _console: &mut Console<'_>) -> io::Result<Flow> {
        Ok(Flow::Continue)
    }

    /// A key arrived.
    ///
    /// `key.repeat` counts rapid repeats of the same key; it resets to 1
    /// whenever the key changes or the multi-keypress window lapses.
    /// `params` carries the raw parameter strings of the escape sequence
    /// that produced the key, and is empty for plain bytes.
    fn on_key(
        &mut self,
        console: &mut Console<'_>,
        key: KeyEvent,
        params: &[String],
    ) -> io::Result<Flow>;

    /// A timer tick. `connected` reports whether a terminal is currently
    /// attached, so periodic hardware work can keep running unattended
    /// while drawing is skipped.
    fn on_timer(&mut self, _console: &mut Console<'_>, _connected: bool) -> io::Result<Flow> {
        Ok(Flow::Continue)
    }

    /// Screen cell of an editable value, for in-place editors.
    ///
    /// Menus report the `(row, col)` where the value of `item` starts so
    /// an [`crate::editor::InplaceEditor`] can draw over it. Sessions
    /// without editable values keep the default.
    fn value_cell(&self, _item: usize) -> Option<(u16, u16)> {
        None
    }
}
