#![forbid(unsafe_code)]

//! SGR text styles.
//!
//! Menus treat styles as opaque tokens attached to values; the only wire
//! knowledge lives here.

use std::io::{self, Write};

use bitflags::bitflags;

bitflags! {
    /// Display attributes for a run of text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextStyle: u8 {
        /// Bold / increased intensity.
        const BOLD = 1 << 0;
        /// Underlined.
        const UNDERLINE = 1 << 1;
        /// Slow blink.
        const BLINK = 1 << 2;
        /// Inverse video; the conventional "highlighted" look.
        const INVERSE = 1 << 3;
    }
}

impl TextStyle {
    /// Write the SGR sequence enabling exactly these attributes.
    ///
    /// An empty style writes the SGR reset.
    pub fn write_sgr(self, out: &mut impl Write) -> io::Result<()> {
        if self.is_empty() {
            return out.write_all(crate::ansi::SGR_RESET);
        }
        out.write_all(b"\x1b[")?;
        let mut first = true;
        for (flag, code) in [
            (TextStyle::BOLD, "1"),
            (TextStyle::UNDERLINE, "4"),
            (TextStyle::BLINK, "5"),
            (TextStyle::INVERSE, "7"),
        ] {
            if self.contains(flag) {
                if !first {
                    out.write_all(b";")?;
                }
                out.write_all(code.as_bytes())?;
                first = false;
            }
        }
        out.write_all(b"m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sgr(style: TextStyle) -> Vec<u8> {
        let mut buf = Vec::new();
        style.write_sgr(&mut buf).unwrap();
        buf
    }

    #[test]
    fn single_attribute() {
        assert_eq!(sgr(TextStyle::INVERSE), b"\x1b[7m");
        assert_eq!(sgr(TextStyle::BOLD), b"\x1b[1m");
    }

    #[test]
    fn combined_attributes_in_fixed_order() {
        assert_eq!(sgr(TextStyle::BOLD | TextStyle::INVERSE), b"\x1b[1;7m");
        assert_eq!(
            sgr(TextStyle::UNDERLINE | TextStyle::BLINK | TextStyle::INVERSE),
            b"\x1b[4;5;7m"
        );
    }

    #[test]
    fn empty_style_resets() {
        assert_eq!(sgr(TextStyle::empty()), b"\x1b[0m");
    }
}
