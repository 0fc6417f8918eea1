#![forbid(unsafe_code)]

//! Session framework for serial-console test rigs.
//!
//! Everything a firmware front panel needs to talk to a VT100-ish
//! terminal over one byte pipe: an event loop multiplexing decoded keys
//! against a drift-free timer, framed menus with right-aligned values,
//! in-place validated editing, and the held-hotkey reboot interceptor.
//!
//! Sessions nest by recursion: a key handler opens a dialog by running
//! the loop again on the same [`Console`], and repaints itself when the
//! call returns. See [`session::Session`] for the contract.

pub mod console;
pub mod editor;
pub mod event_loop;
pub mod frame;
pub mod menu;
pub mod reboot;
pub mod session;

pub use console::Console;
pub use event_loop::{LoopOptions, MULTI_KEYPRESS_WINDOW, run, run_with};
pub use session::{DEFAULT_TIMER_PERIOD, Flow, Session};
