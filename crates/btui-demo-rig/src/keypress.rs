#![forbid(unsafe_code)]

//! Keypress viewer: print every decoded key until Ctrl-D.
//!
//! Deliberately border-less; lines scroll off the top of a real
//! terminal on their own. Useful for checking what a given terminal
//! emulator actually sends.

use std::io;

use btui_console::{Console, Flow, Session};
use btui_core::event::{KeyEvent, control};

#[derive(Debug, Default)]
pub struct KeypressViewer;

impl KeypressViewer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Session for KeypressViewer {
    fn redraw(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        console.clear_screen()?;
        console.put("Type some keys (terminate with Ctrl-d)")?;
        console.write_all(b"\r\n")
    }

    fn on_key(
        &mut self,
        console: &mut Console<'_>,
        key: KeyEvent,
        params: &[String],
    ) -> io::Result<Flow> {
        let mut line = match key.code.as_byte() {
            Some(byte) => {
                let shown = if (0x20..=0x7E).contains(&byte) {
                    byte as char
                } else {
                    ' '
                };
                format!("{shown} {byte} \\{byte:o} {}", key.repeat)
            }
            None => format!("{} {}", key.code, key.repeat),
        };
        if !params.is_empty() {
            line.push_str(" (");
            line.push_str(&params.join(", "));
            line.push(')');
        }
        console.write_all(line.as_bytes())?;
        console.write_all(b"\r\n")?;

        if key.is_byte(control::CANCEL) {
            // Ctrl-C fires a size probe so the cursor report shows up as
            // its own line above.
            console.request_screen_size()?;
        }
        if key.is_byte(control::END_OF_INPUT) {
            return Ok(Flow::Exit(0));
        }
        Ok(Flow::Continue)
    }
}
