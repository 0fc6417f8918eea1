#![forbid(unsafe_code)]

//! Host TTY port.
//!
//! Puts the controlling terminal into raw mode for the lifetime of the
//! port and feeds stdin bytes through a reader thread, so reads can carry
//! the loop's deadline-derived timeout without blocking past it.
//!
//! # Lifecycle Guarantees
//!
//! Raw mode is exited and the cursor restored on every path out: drop,
//! panic (via a panic hook), SIGINT/SIGTERM (via a signal watcher thread),
//! and the watchdog-reset path. In raw mode Ctrl-C arrives as byte 0x03
//! rather than raising SIGINT, so sessions see it as an ordinary key; the
//! signal path matters for `kill` and abnormal termination.

use std::io::{self, Read, Write};
use std::sync::OnceLock;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use btui_core::ansi;

use crate::ConsolePort;

#[cfg(unix)]
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};

/// [`ConsolePort`] over the process's controlling terminal.
#[derive(Debug)]
pub struct TtyPort {
    rx: Receiver<u8>,
    stdout: io::Stdout,
    /// Stdin hit end of file; reported as a disconnect.
    eof: bool,
    _raw: RawModeGuard,
    #[cfg(unix)]
    _signals: SignalGuard,
}

impl TtyPort {
    /// Enter raw mode and start the stdin reader.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be enabled.
    pub fn new() -> io::Result<Self> {
        install_panic_hook();
        let raw = RawModeGuard::new()?;
        #[cfg(unix)]
        let signals = SignalGuard::new()?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut stdin = io::stdin();
            let mut buf = [0u8; 1];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(buf[0]).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            rx,
            stdout: io::stdout(),
            eof: false,
            _raw: raw,
            #[cfg(unix)]
            _signals: signals,
        })
    }
}

impl ConsolePort for TtyPort {
    fn is_connected(&mut self) -> bool {
        !self.eof
    }

    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        match self.rx.recv_timeout(timeout) {
            Ok(byte) => Ok(Some(byte)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                self.eof = true;
                Ok(None)
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stdout.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn idle_sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }

    fn trigger_watchdog_reset(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::warn!("watchdog reset requested, restoring terminal and exiting");
        best_effort_cleanup();
        std::process::exit(0);
    }
}

/// RAII raw-mode entry/exit.
#[derive(Debug)]
struct RawModeGuard;

impl RawModeGuard {
    fn new() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        #[cfg(feature = "tracing")]
        tracing::info!("terminal raw mode enabled");
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        best_effort_cleanup();
        #[cfg(feature = "tracing")]
        tracing::info!("terminal raw mode disabled");
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(ansi::SGR_RESET);
    let _ = stdout.write_all(ansi::CURSOR_SHOW);
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}

#[cfg(unix)]
#[derive(Debug)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new() -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = thread::spawn(move || {
            for signal in signals.forever() {
                if matches!(signal, SIGINT | SIGTERM) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(signal, "termination signal received, cleaning up");
                    best_effort_cleanup();
                    std::process::exit(128 + signal);
                }
            }
        });
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
