//! The reboot interceptor.
//!
//! Rebooting the tester must survive a cat on the keyboard: the hotkey
//! only opens this dialog, and the dialog demands the same hotkey be
//! held until a ten-place track fills before it touches the watchdog.
//! Anything else cancels: another key, a dropped connection, or a
//! second of silence.

use std::io;
use std::time::Duration;

use btui_core::event::{KeyEvent, control};
use btui_core::geometry::Anchor;
use btui_core::style::TextStyle;
use tracing::{debug, warn};

use crate::console::Console;
use crate::frame::Frame;
use crate::session::{Flow, Session};

/// Hotkey presses needed to commit the reboot.
const TRACK_LEN: u16 = 10;

/// Timer ticks without a hotkey press before the dialog gives up.
const IDLE_TICK_LIMIT: u32 = 100;

/// How long the cancellation banner stays up.
const CANCEL_DWELL: Duration = Duration::from_millis(1000);

const PROMPT: &str = "Hold ctrl-b to reboot : ";

/// Modal dialog standing between the hotkey and the watchdog.
///
/// Runs as a nested session with the hotkey interception disabled, so
/// the presses that fill the track arrive as ordinary keys.
#[derive(Debug)]
pub struct RebootSession {
    frame: Frame,
    presses: u16,
    idle_ticks: u32,
}

impl RebootSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame: Frame::new(Some("Reboot"), 7, 40, Anchor::Center)
                .with_clear_on_redraw(false),
            presses: 0,
            idle_ticks: 0,
        }
    }

    fn track_col(&self) -> u16 {
        self.frame.rect().col + 3 + PROMPT.len() as u16
    }

    /// Centered cancellation banner over the prompt row, then a pause so
    /// it registers before the parent repaints.
    fn cancel(&self, console: &mut Console<'_>) -> io::Result<Flow> {
        debug!(presses = self.presses, "reboot cancelled");
        let rect = self.frame.rect();
        if rect.width >= 6 {
            console.move_to(rect.row + 4, rect.col + 3)?;
            console.save_cursor()?;
            console.set_style(TextStyle::INVERSE)?;
            console.put_centered("  CANCELLED  ", rect.width - 6, 'X')?;
            console.restore_cursor()?;
            console.flush()?;
        }
        console.sleep(CANCEL_DWELL);
        Ok(Flow::Exit(0))
    }
}

impl Default for RebootSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for RebootSession {
    fn redraw(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        let rect = self.frame.draw(console)?;
        console.move_to(rect.row + 4, rect.col + 3)?;
        console.put(PROMPT)?;
        for place in 0..TRACK_LEN {
            console.put(if place < self.presses { "X" } else { "_" })?;
        }
        Ok(())
    }

    fn on_key(
        &mut self,
        console: &mut Console<'_>,
        key: KeyEvent,
        _params: &[String],
    ) -> io::Result<Flow> {
        if !key.is_byte(control::REBOOT_HOTKEY) {
            return self.cancel(console);
        }
        self.idle_ticks = 0;
        self.presses += 1;
        console.move_to(self.frame.rect().row + 4, self.track_col() + self.presses - 1)?;
        console.put("X")?;
        if self.presses >= TRACK_LEN {
            console.flush()?;
            warn!("reboot track filled, triggering watchdog reset");
            console.trigger_watchdog_reset();
            return Ok(Flow::Exit(0));
        }
        Ok(Flow::Continue)
    }

    fn on_disconnect(&mut self, _console: &mut Console<'_>) -> io::Result<Flow> {
        debug!("reboot cancelled by disconnect");
        Ok(Flow::Exit(0))
    }

    fn on_timer(&mut self, console: &mut Console<'_>, _connected: bool) -> io::Result<Flow> {
        self.idle_ticks += 1;
        if self.idle_ticks > IDLE_TICK_LIMIT {
            return self.cancel(console);
        }
        Ok(Flow::Continue)
    }
}
