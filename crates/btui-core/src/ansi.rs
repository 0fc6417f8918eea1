#![forbid(unsafe_code)]

//! ANSI/VT100 output primitives.
//!
//! Byte-string constants for the fixed control sequences the console emits
//! and tiny writers for the parameterized ones. Everything targets
//! [`std::io::Write`] so both live ports and capture buffers work.
//!
//! Coordinates are 0-indexed here; the writers add the 1 the wire format
//! expects.

use std::io::{self, Write};

/// Clear the whole screen.
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";

/// Move the cursor to the top-left corner.
pub const CURSOR_HOME: &[u8] = b"\x1b[H";

/// Make the cursor visible.
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

/// Hide the cursor.
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";

/// Save cursor position and attributes (DECSC).
pub const CURSOR_SAVE: &[u8] = b"\x1b7";

/// Restore saved cursor position and attributes (DECRC).
pub const CURSOR_RESTORE: &[u8] = b"\x1b8";

/// Reset all SGR attributes.
pub const SGR_RESET: &[u8] = b"\x1b[0m";

/// Terminal bell.
pub const BELL: &[u8] = b"\x07";

/// Ask the terminal where the cursor is (DSR 6); the reply is the
/// `ESC [ row ; col R` cursor-position report.
pub const CURSOR_POSITION_QUERY: &[u8] = b"\x1b[6n";

/// Screen-size negotiation probe: park the cursor at the far corner, ask
/// for its position, and put it back. The clamped reply row/column is the
/// terminal size.
pub const SIZE_PROBE: &[u8] = b"\x1b7\x1b[999;999H\x1b[6n\x1b8";

/// Move the cursor to a 0-indexed row/column.
pub fn move_to(out: &mut impl Write, row: u16, col: u16) -> io::Result<()> {
    write!(
        out,
        "\x1b[{};{}H",
        u32::from(row) + 1,
        u32::from(col) + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_to_is_one_indexed_on_the_wire() {
        let mut buf = Vec::new();
        move_to(&mut buf, 0, 0).unwrap();
        assert_eq!(buf, b"\x1b[1;1H");

        buf.clear();
        move_to(&mut buf, 23, 79).unwrap();
        assert_eq!(buf, b"\x1b[24;80H");
    }

    #[test]
    fn move_to_survives_the_u16_edge() {
        let mut buf = Vec::new();
        move_to(&mut buf, u16::MAX, u16::MAX).unwrap();
        assert_eq!(buf, b"\x1b[65536;65536H");
    }

    #[test]
    fn size_probe_wraps_query_in_save_restore() {
        assert!(SIZE_PROBE.starts_with(CURSOR_SAVE));
        assert!(SIZE_PROBE.ends_with(CURSOR_RESTORE));
        let inner = &SIZE_PROBE[CURSOR_SAVE.len()..SIZE_PROBE.len() - CURSOR_RESTORE.len()];
        assert!(inner.ends_with(CURSOR_POSITION_QUERY));
    }
}
