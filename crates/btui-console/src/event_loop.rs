#![forbid(unsafe_code)]

//! The per-session event loop.
//!
//! [`run`] multiplexes one session against its console port: bytes are
//! read with a timeout derived from the timer schedule, escape sequences
//! are decoded incrementally, and timer callbacks fire at a drift-free
//! cadence. Nested dialogs run the same loop recursively on the same
//! console, so modal flows are plain function calls.
//!
//! # Design Notes
//!
//! - Timer deadlines advance relative to the previous deadline, never
//!   relative to "now". A callback that runs long produces catch-up ticks
//!   instead of a slowed-down clock, so a session counting ticks keeps
//!   wall-clock time.
//! - Repeat counting and the pending escape sequence are loop-local. A
//!   nested session starts with a clean slate and the parent's state is
//!   untouched when it returns.
//! - A bare ESC cannot be distinguished from the start of a sequence by
//!   bytes alone. The multi-keypress window settles it: if the rest of
//!   the sequence does not arrive in time, the accumulated bytes replay
//!   as ordinary keystrokes with repeat count 1.

use std::io;
use std::time::{Duration, Instant};

use btui_core::decoder::{Decoded, EscapeDecoder};
use btui_core::event::{KeyCode, KeyEvent, control};
use btui_core::geometry::ScreenSize;
use tracing::{debug, trace};

use crate::console::Console;
use crate::reboot::RebootSession;
use crate::session::{Flow, Session};

/// Two presses of the same key within this window count as a repeat run;
/// it also bounds how long a partial escape sequence may stay pending.
pub const MULTI_KEYPRESS_WINDOW: Duration = Duration::from_millis(100);

/// Poll cadence while no terminal is attached.
const DISCONNECTED_POLL: Duration = Duration::from_millis(1);

/// Switches for the input features layered on top of raw bytes.
///
/// The defaults suit ordinary sessions; the reboot interceptor runs
/// itself with `reboot_hotkey` off so holding the hotkey cannot nest
/// another interceptor.
#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    /// Decode escape sequences and negotiate the screen size. When off,
    /// every byte (ESC included) is delivered as-is and the session is
    /// drawn immediately with the default geometry.
    pub decode_escapes: bool,
    /// Intercept the reboot hotkey before the session sees it.
    pub reboot_hotkey: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            decode_escapes: true,
            reboot_hotkey: true,
        }
    }
}

/// Run a session to completion with default [`LoopOptions`].
pub fn run(console: &mut Console<'_>, session: &mut dyn Session) -> io::Result<i32> {
    run_with(console, session, LoopOptions::default())
}

/// Run a session to completion.
///
/// Returns the exit code of the [`Flow::Exit`] that ended the session.
/// Recursing from a key handler is the supported way to open a modal
/// dialog; when the nested call returns, redraw and carry on.
pub fn run_with(
    console: &mut Console<'_>,
    session: &mut dyn Session,
    options: LoopOptions,
) -> io::Result<i32> {
    let mut state = LoopState::new(options, session.timer_period(), console.now());
    debug!(?options, period_ms = state.period.as_millis() as u64, "session started");

    let mut was_connected = false;
    loop {
        if console.is_connected() {
            if !was_connected {
                was_connected = true;
                if let Flow::Exit(code) = state.connect(console, session)? {
                    return Ok(code);
                }
            }

            let timeout = state.next_deadline.saturating_duration_since(console.now());
            let byte = console.read_byte(timeout)?;
            let now = console.now();

            if now.duration_since(state.last_key_time) > MULTI_KEYPRESS_WINDOW {
                if let Flow::Exit(code) = state.expire_window(console, session)? {
                    return Ok(code);
                }
            }

            if let Some(byte) = byte {
                state.last_key_time = now;
                let flow = state.handle_byte(console, session, byte)?;
                console.flush()?;
                if let Flow::Exit(code) = flow {
                    debug!(code, "session closed by key handler");
                    return Ok(code);
                }
            }
        } else {
            if was_connected {
                debug!("terminal disconnected");
                if let Flow::Exit(code) = session.on_disconnect(console)? {
                    return Ok(code);
                }
                was_connected = false;
                state.drop_input_state();
            }
            console.sleep(DISCONNECTED_POLL);
        }

        if console.now() >= state.next_deadline {
            state.next_deadline += state.period;
            console.set_next_deadline(state.next_deadline);
            let flow = session.on_timer(console, was_connected)?;
            state.next_deadline = console.next_deadline();
            console.flush()?;
            if let Flow::Exit(code) = flow {
                debug!(code, "session closed by timer");
                return Ok(code);
            }
        }
    }
}

/// Per-invocation loop state. Each (possibly nested) `run_with` call owns
/// one of these; nothing here is shared across nesting levels.
struct LoopState {
    options: LoopOptions,
    period: Duration,
    next_deadline: Instant,
    decoder: EscapeDecoder,
    last_key: Option<KeyCode>,
    repeat: u32,
    last_key_time: Instant,
    size_query_outstanding: bool,
}

impl LoopState {
    fn new(options: LoopOptions, period: Duration, now: Instant) -> Self {
        Self {
            options,
            period,
            next_deadline: now + period,
            decoder: EscapeDecoder::new(),
            last_key: None,
            repeat: 0,
            last_key_time: now,
            size_query_outstanding: false,
        }
    }

    /// Connection edge: run the hook, then either probe for the screen
    /// size or (without escape decoding) draw immediately.
    fn connect(
        &mut self,
        console: &mut Console<'_>,
        session: &mut dyn Session,
    ) -> io::Result<Flow> {
        debug!("terminal connected");
        self.last_key_time = console.now();
        if let Flow::Exit(code) = session.on_connect(console)? {
            return Ok(Flow::Exit(code));
        }
        if self.options.decode_escapes {
            console.request_screen_size()?;
            self.size_query_outstanding = true;
        } else {
            session.redraw(console)?;
        }
        console.flush()?;
        Ok(Flow::Continue)
    }

    /// The multi-keypress window lapsed: repeat runs end, then an
    /// unanswered size query gives up and redraws before any pending
    /// sequence replays, so the replayed keys land on a painted screen.
    fn expire_window(
        &mut self,
        console: &mut Console<'_>,
        session: &mut dyn Session,
    ) -> io::Result<Flow> {
        self.last_key = None;
        self.repeat = 0;
        if self.size_query_outstanding {
            debug!("size query unanswered, drawing with current geometry");
            self.size_query_outstanding = false;
            session.redraw(console)?;
            console.flush()?;
        }
        if self.decoder.pending() {
            if let Flow::Exit(code) = self.replay_pending(console, session)? {
                return Ok(Flow::Exit(code));
            }
        }
        Ok(Flow::Continue)
    }

    fn handle_byte(
        &mut self,
        console: &mut Console<'_>,
        session: &mut dyn Session,
        byte: u8,
    ) -> io::Result<Flow> {
        if self.decoder.pending() {
            self.handle_sequence_byte(console, session, byte)
        } else {
            self.handle_plain_byte(console, session, byte)
        }
    }

    /// Route one byte of a pending escape sequence.
    fn handle_sequence_byte(
        &mut self,
        console: &mut Console<'_>,
        session: &mut dyn Session,
        byte: u8,
    ) -> io::Result<Flow> {
        match self.decoder.feed(byte) {
            Decoded::Incomplete => Ok(Flow::Continue),
            Decoded::Key(KeyCode::CursorReport) if self.size_query_outstanding => {
                let params = self.decoder.params();
                if let [rows, cols] = params {
                    match (rows.parse::<u16>(), cols.parse::<u16>()) {
                        (Ok(rows), Ok(cols)) if rows > 0 && cols > 0 => {
                            debug!(rows, cols, "screen size negotiated");
                            console.set_screen(ScreenSize::new(rows, cols));
                        }
                        _ => debug!(?params, "ignoring malformed cursor report"),
                    }
                }
                self.decoder.reset();
                self.size_query_outstanding = false;
                session.redraw(console)?;
                Ok(Flow::Continue)
            }
            Decoded::Key(KeyCode::CursorReport) => {
                // An unsolicited report is delivered like any other key,
                // but it never joins a repeat run.
                self.last_key = None;
                self.repeat = 0;
                let params = self.decoder.params().to_vec();
                self.decoder.reset();
                self.dispatch(console, session, KeyEvent::new(KeyCode::CursorReport), &params)
            }
            Decoded::Key(code) => {
                self.finish_size_query(console, session)?;
                let repeat = self.count_repeat(code);
                let params = self.decoder.params().to_vec();
                self.decoder.reset();
                self.dispatch(
                    console,
                    session,
                    KeyEvent::new(code).with_repeat(repeat),
                    &params,
                )
            }
            Decoded::Invalid | Decoded::Unsupported => {
                self.last_key = None;
                self.repeat = 0;
                self.replay_pending(console, session)
            }
        }
    }

    /// Route a byte that is not part of an escape sequence.
    fn handle_plain_byte(
        &mut self,
        console: &mut Console<'_>,
        session: &mut dyn Session,
        byte: u8,
    ) -> io::Result<Flow> {
        match byte {
            control::ESC if self.options.decode_escapes => {
                // Repeat state survives: ESC ESC must count as a repeated
                // Escape once the pair resolves.
                self.decoder.begin();
                Ok(Flow::Continue)
            }
            control::REDRAW => {
                debug!("redraw requested");
                self.last_key = None;
                self.repeat = 0;
                if self.options.decode_escapes {
                    console.request_screen_size()?;
                    self.size_query_outstanding = true;
                } else {
                    session.redraw(console)?;
                }
                Ok(Flow::Continue)
            }
            control::REBOOT_HOTKEY if self.options.reboot_hotkey => {
                self.last_key = None;
                self.repeat = 0;
                let mut dialog = RebootSession::new();
                let code = run_with(
                    console,
                    &mut dialog,
                    LoopOptions {
                        decode_escapes: true,
                        reboot_hotkey: false,
                    },
                )?;
                debug!(code, "reboot interceptor closed");
                session.redraw(console)?;
                Ok(Flow::Continue)
            }
            _ => {
                self.finish_size_query(console, session)?;
                let code = KeyCode::Byte(byte);
                let repeat = self.count_repeat(code);
                self.dispatch(console, session, KeyEvent::new(code).with_repeat(repeat), &[])
            }
        }
    }

    /// Replay an abandoned sequence byte by byte, repeat count 1 each.
    fn replay_pending(
        &mut self,
        console: &mut Console<'_>,
        session: &mut dyn Session,
    ) -> io::Result<Flow> {
        let bytes = self.decoder.take_replay();
        debug!(count = bytes.len(), "replaying unresolved sequence as keys");
        for byte in bytes {
            let flow = self.dispatch(
                console,
                session,
                KeyEvent::new(KeyCode::Byte(byte)),
                &[],
            )?;
            if flow.is_exit() {
                return Ok(flow);
            }
        }
        console.flush()?;
        Ok(Flow::Continue)
    }

    /// A real key arrived while a size query was pending: give up on the
    /// reply and draw first, so the handler paints onto a laid-out screen.
    fn finish_size_query(
        &mut self,
        console: &mut Console<'_>,
        session: &mut dyn Session,
    ) -> io::Result<()> {
        if self.size_query_outstanding {
            self.size_query_outstanding = false;
            session.redraw(console)?;
        }
        Ok(())
    }

    fn count_repeat(&mut self, code: KeyCode) -> u32 {
        if self.last_key == Some(code) {
            self.repeat += 1;
        } else {
            self.last_key = Some(code);
            self.repeat = 1;
        }
        self.repeat
    }

    fn dispatch(
        &mut self,
        console: &mut Console<'_>,
        session: &mut dyn Session,
        key: KeyEvent,
        params: &[String],
    ) -> io::Result<Flow> {
        trace!(key = %key.code, repeat = key.repeat, "key");
        session.on_key(console, key, params)
    }

    /// Forget everything tied to the lost connection.
    fn drop_input_state(&mut self) {
        self.decoder.reset();
        self.size_query_outstanding = false;
        self.last_key = None;
        self.repeat = 0;
    }
}
