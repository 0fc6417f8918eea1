#![forbid(unsafe_code)]

//! Console transport ports.
//!
//! A [`ConsolePort`] is everything the event loop needs from the outside
//! world: a byte link with a connection state, a monotonic clock, and the
//! watchdog-reset trigger. The clock lives on the port so a simulated port
//! can run the loop on virtual time.
//!
//! Two implementations ship here: [`tty::TtyPort`] drives a host terminal,
//! [`sim::SimPort`] replays a scripted timeline for tests.

use std::io;
use std::time::{Duration, Instant};

pub mod sim;
pub mod tty;

/// The byte transport and clock behind a console.
///
/// On microcontroller firmware this is the USB-serial link plus the
/// hardware timer and watchdog; on a host it is the TTY; in tests it is a
/// script.
pub trait ConsolePort {
    /// Whether a terminal is attached right now.
    fn is_connected(&mut self) -> bool;

    /// Read one byte, waiting at most `timeout`.
    ///
    /// `Ok(None)` means the timeout elapsed (or the connection dropped)
    /// with nothing to read; that is the loop's normal idle path, not an
    /// error.
    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>>;

    /// Queue bytes for the terminal.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Push queued bytes out.
    fn flush(&mut self) -> io::Result<()>;

    /// Monotonic clock reading. All loop scheduling goes through this, so
    /// a port with a virtual clock controls time completely.
    fn now(&self) -> Instant;

    /// Sleep used on dwell effects and the disconnected idle path.
    fn idle_sleep(&mut self, duration: Duration);

    /// Commit to a watchdog-backed reboot.
    ///
    /// On real hardware this arms the watchdog and never returns. Host and
    /// simulated ports do return (restoring the terminal or counting the
    /// request) so the interceptor's loop can unwind normally.
    fn trigger_watchdog_reset(&mut self);
}
