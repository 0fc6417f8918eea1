#![forbid(unsafe_code)]

//! Logical key events.
//!
//! Raw console bytes resolve to [`KeyCode`] values: plain byte keys for
//! printable and control input, named variants for the navigation and
//! function keys carried by escape sequences, and a synthetic
//! [`KeyCode::CursorReport`] for the terminal's cursor-position reply.
//!
//! # Design Notes
//!
//! - A byte key keeps its raw value; the console gives a handful of control
//!   bytes framework-wide meaning (see [`control`]).
//! - Repeat counting lives in [`KeyEvent`], not in the code itself: the same
//!   `KeyCode` is delivered with a growing repeat count while the key is
//!   held within the multi-keypress window.

use std::fmt;

/// ASCII control bytes with console-wide meaning.
pub mod control {
    /// Ctrl-B. Held to arm the reboot interceptor.
    pub const REBOOT_HOTKEY: u8 = 0x02;
    /// Ctrl-C. Cancels an input dialog.
    pub const CANCEL: u8 = 0x03;
    /// Ctrl-D. End of input; also cancels an input dialog.
    pub const END_OF_INPUT: u8 = 0x04;
    /// Backspace.
    pub const BACKSPACE: u8 = 0x08;
    /// Line feed; accepted as Enter.
    pub const LINE_FEED: u8 = 0x0A;
    /// Ctrl-L. Forces a repaint and size renegotiation.
    pub const REDRAW: u8 = 0x0C;
    /// Carriage return; the usual Enter byte in raw mode.
    pub const ENTER: u8 = 0x0D;
    /// Ctrl-U. Clears an input field.
    pub const CLEAR_FIELD: u8 = 0x15;
    /// Escape, both a keystroke and the sequence introducer.
    pub const ESC: u8 = 0x1B;
    /// Rubout; most terminals send this for Backspace.
    pub const DEL: u8 = 0x7F;
}

/// A logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable or control byte delivered as-is.
    Byte(u8),
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Right arrow.
    Right,
    /// Left arrow.
    Left,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Insert.
    Insert,
    /// Delete (the navigation key, not the DEL byte).
    Delete,
    /// Function key F0..=F12.
    F(u8),
    /// Cursor-position report, `ESC [ row ; col R`.
    ///
    /// Normally consumed by the event loop to renegotiate the screen size;
    /// delivered to the session only when no size query is outstanding.
    CursorReport,
}

impl KeyCode {
    /// The control-byte key for a letter, e.g. `ctrl(b'b')` for Ctrl-B.
    #[must_use]
    pub const fn ctrl(letter: u8) -> Self {
        KeyCode::Byte(letter & 0x1F)
    }

    /// Raw byte value, if this is a byte key.
    #[must_use]
    pub const fn as_byte(self) -> Option<u8> {
        match self {
            KeyCode::Byte(b) => Some(b),
            _ => None,
        }
    }

    /// Check for a specific byte key.
    #[must_use]
    pub const fn is_byte(self, byte: u8) -> bool {
        matches!(self, KeyCode::Byte(b) if b == byte)
    }

    /// True for byte keys in the printable ASCII range.
    #[must_use]
    pub const fn is_printable(self) -> bool {
        matches!(self, KeyCode::Byte(b) if b >= 0x20 && b <= 0x7E)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            KeyCode::Byte(b) if (0x20..=0x7E).contains(&b) => write!(f, "{}", b as char),
            KeyCode::Byte(b) if b < 0x20 => write!(f, "^{}", (b + 0x40) as char),
            KeyCode::Byte(0x7F) => f.write_str("DEL"),
            KeyCode::Byte(b) => write!(f, "\\x{b:02X}"),
            KeyCode::Up => f.write_str("Up"),
            KeyCode::Down => f.write_str("Down"),
            KeyCode::Right => f.write_str("Right"),
            KeyCode::Left => f.write_str("Left"),
            KeyCode::Home => f.write_str("Home"),
            KeyCode::End => f.write_str("End"),
            KeyCode::PageUp => f.write_str("PageUp"),
            KeyCode::PageDown => f.write_str("PageDown"),
            KeyCode::Insert => f.write_str("Insert"),
            KeyCode::Delete => f.write_str("Delete"),
            KeyCode::F(n) => write!(f, "F{n}"),
            KeyCode::CursorReport => f.write_str("CursorReport"),
        }
    }
}

/// A resolved key press with its repeat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub code: KeyCode,
    /// Consecutive identical presses with no intervening timeout, starting
    /// at 1. Replayed bytes from abandoned sequences always carry 1.
    pub repeat: u32,
}

impl KeyEvent {
    /// A fresh press (repeat count 1).
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self { code, repeat: 1 }
    }

    /// The same key with an explicit repeat count.
    #[must_use]
    pub const fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    /// True only for the first press in a repeat run. Rejection feedback
    /// (the terminal bell) fires on this press and stays quiet while the
    /// key is held.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.repeat == 1
    }

    /// Check for a specific byte key.
    #[must_use]
    pub const fn is_byte(&self, byte: u8) -> bool {
        self.code.is_byte(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_maps_to_control_bytes() {
        assert_eq!(KeyCode::ctrl(b'b'), KeyCode::Byte(control::REBOOT_HOTKEY));
        assert_eq!(KeyCode::ctrl(b'l'), KeyCode::Byte(control::REDRAW));
        assert_eq!(KeyCode::ctrl(b'u'), KeyCode::Byte(control::CLEAR_FIELD));
        // Uppercase letters map to the same bytes.
        assert_eq!(KeyCode::ctrl(b'B'), KeyCode::Byte(0x02));
    }

    #[test]
    fn printable_range() {
        assert!(KeyCode::Byte(b' ').is_printable());
        assert!(KeyCode::Byte(b'~').is_printable());
        assert!(!KeyCode::Byte(0x1F).is_printable());
        assert!(!KeyCode::Byte(0x7F).is_printable());
        assert!(!KeyCode::Up.is_printable());
    }

    #[test]
    fn display_forms() {
        assert_eq!(KeyCode::Byte(b'a').to_string(), "a");
        assert_eq!(KeyCode::Byte(0x02).to_string(), "^B");
        assert_eq!(KeyCode::Byte(0x7F).to_string(), "DEL");
        assert_eq!(KeyCode::F(5).to_string(), "F5");
        assert_eq!(KeyCode::PageDown.to_string(), "PageDown");
    }

    #[test]
    fn repeat_tracking() {
        let key = KeyEvent::new(KeyCode::Byte(b'+'));
        assert!(key.is_first());
        let held = key.with_repeat(15);
        assert_eq!(held.repeat, 15);
        assert!(!held.is_first());
        assert!(held.is_byte(b'+'));
    }
}
