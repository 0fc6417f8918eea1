#![forbid(unsafe_code)]

//! Scripted simulation port.
//!
//! Drives the event loop on a virtual clock: reads consume a pre-built
//! timeline of byte arrivals and connection edges, and every timeout or
//! dwell advances virtual time instead of sleeping. A whole
//! multi-second interaction runs in microseconds and is exactly
//! reproducible.
//!
//! Script steps are appended relative to a running cursor:
//!
//! ```
//! use std::time::Duration;
//! use btui_port::sim::SimPort;
//!
//! let mut port = SimPort::new();
//! port.feed(b"abc");                                  // t = 0
//! port.feed_after(Duration::from_millis(150), b"\r"); // t = 150ms
//! port.disconnect_after(Duration::from_millis(10));   // t = 160ms
//! ```

use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use crate::ConsolePort;

#[derive(Debug, Clone, Copy)]
enum Step {
    Byte(u8),
    Connected(bool),
}

#[derive(Debug, Clone, Copy)]
struct Timed {
    at: Duration,
    step: Step,
}

/// Deterministic [`ConsolePort`] for tests.
#[derive(Debug)]
pub struct SimPort {
    /// Real anchor for `now()`; virtual time is an offset from it.
    epoch: Instant,
    /// Virtual time elapsed since the epoch.
    clock: Cell<Duration>,
    /// Pending steps, ordered by `at`.
    script: VecDeque<Timed>,
    /// Append position for the builder methods.
    cursor: Duration,
    connected: bool,
    output: Vec<u8>,
    resets: u32,
}

impl Default for SimPort {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPort {
    /// A connected port with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            clock: Cell::new(Duration::ZERO),
            script: VecDeque::new(),
            cursor: Duration::ZERO,
            connected: true,
            output: Vec::new(),
            resets: 0,
        }
    }

    /// Append bytes arriving together at the script cursor.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.script.push_back(Timed {
                at: self.cursor,
                step: Step::Byte(b),
            });
        }
    }

    /// Advance the script cursor by `gap`, then append bytes.
    pub fn feed_after(&mut self, gap: Duration, bytes: &[u8]) {
        self.cursor += gap;
        self.feed(bytes);
    }

    /// Script a disconnect `gap` after the previous step.
    pub fn disconnect_after(&mut self, gap: Duration) {
        self.cursor += gap;
        self.script.push_back(Timed {
            at: self.cursor,
            step: Step::Connected(false),
        });
    }

    /// Script a reconnect `gap` after the previous step.
    pub fn reconnect_after(&mut self, gap: Duration) {
        self.cursor += gap;
        self.script.push_back(Timed {
            at: self.cursor,
            step: Step::Connected(true),
        });
    }

    /// Everything the console wrote so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Output as text, for substring assertions on drawn screens.
    #[must_use]
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Take the captured output, leaving the buffer empty.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// How many times the watchdog reset was requested.
    #[must_use]
    pub fn reset_count(&self) -> u32 {
        self.resets
    }

    /// Virtual time elapsed since the port was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock.get()
    }

    /// True once every scripted step has been consumed.
    #[must_use]
    pub fn script_exhausted(&self) -> bool {
        self.script.is_empty()
    }

    fn advance_to(&self, at: Duration) {
        if at > self.clock.get() {
            self.clock.set(at);
        }
    }
}

impl ConsolePort for SimPort {
    fn is_connected(&mut self) -> bool {
        // Apply connection edges that are due and not blocked behind
        // unread bytes (a buffered transport delivers in order).
        while let Some(front) = self.script.front() {
            if front.at > self.clock.get() {
                break;
            }
            match front.step {
                Step::Connected(c) => {
                    self.connected = c;
                    self.script.pop_front();
                }
                Step::Byte(_) => break,
            }
        }
        self.connected
    }

    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        let deadline = self.clock.get() + timeout;
        while let Some(front) = self.script.front() {
            if front.at > deadline {
                break;
            }
            let timed = *front;
            self.script.pop_front();
            self.advance_to(timed.at);
            match timed.step {
                Step::Byte(b) => return Ok(Some(b)),
                Step::Connected(c) => {
                    self.connected = c;
                    if !c {
                        // A drop aborts the read; the loop notices on its
                        // next connectivity check.
                        return Ok(None);
                    }
                }
            }
        }
        self.clock.set(deadline);
        Ok(None)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn now(&self) -> Instant {
        self.epoch + self.clock.get()
    }

    fn idle_sleep(&mut self, duration: Duration) {
        self.clock.set(self.clock.get() + duration);
    }

    fn trigger_watchdog_reset(&mut self) {
        self.resets += 1;
    }
}
