//! In-place editing over a live menu, end to end.

use std::io;
use std::time::Duration;

use btui_console::editor::{self, FramedInput, Grammar, input_value_in_range};
use btui_console::frame::Frame;
use btui_console::menu::{ItemList, MenuItem};
use btui_console::{Console, Flow, Session, run};
use btui_core::event::KeyEvent;
use btui_port::sim::SimPort;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// A one-item menu whose `V` key edits the value through the range
/// helper, recording what came back.
struct LevelMenu {
    frame: Frame,
    items: ItemList,
    min: i32,
    max: i32,
    edits: Vec<Option<i32>>,
}

impl LevelMenu {
    fn new(min: i32, max: i32) -> Self {
        Self {
            frame: Frame::full_screen(Some("Test Rig")),
            items: ItemList::new(vec![MenuItem::new("Level", 3).with_value("42")]),
            min,
            max,
            edits: Vec::new(),
        }
    }
}

impl Session for LevelMenu {
    fn redraw(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        let rect = self.frame.draw(console)?;
        self.items.layout(rect, self.frame.has_title());
        self.items.draw_items(console)
    }

    fn value_cell(&self, item: usize) -> Option<(u16, u16)> {
        self.items.value_cell(item)
    }

    fn on_key(
        &mut self,
        console: &mut Console<'_>,
        key: KeyEvent,
        _params: &[String],
    ) -> io::Result<Flow> {
        if key.is_byte(b'V') {
            let (min, max) = (self.min, self.max);
            let edited = input_value_in_range(console, self, 0, min, max)?;
            if let Some(value) = edited {
                self.items.set_value(console, 0, value.to_string())?;
            }
            self.edits.push(edited);
            return Ok(Flow::Continue);
        }
        if key.is_byte(b'q') {
            return Ok(Flow::Exit(5));
        }
        Ok(Flow::Continue)
    }
}

fn drive(port: &mut SimPort, session: &mut dyn Session) -> i32 {
    let mut console = Console::new(port);
    run(&mut console, session).expect("sim port never fails")
}

#[test]
fn accepted_input_updates_the_cell() {
    let mut port = SimPort::new();
    port.feed(b"\x1b[24;80R");
    port.feed_after(ms(10), b"V");
    port.feed_after(ms(10), b"57\r");
    port.feed_after(ms(10), b"q");

    let mut menu = LevelMenu::new(0, 255);
    let code = drive(&mut port, &mut menu);

    assert_eq!(code, 5);
    assert_eq!(menu.edits, vec![Some(57)]);
    assert_eq!(menu.items.value(0), "57");

    let out = port.output_text();
    // The item cell sits at row 12, column 72 on the default layout.
    // The field opens empty, grows as digits land, and the accepted
    // value is repainted plain by the menu afterwards.
    assert!(
        out.contains("\x1b[13;73H\x1b7\x1b[7m___\x1b8"),
        "empty field missing: {out:?}"
    );
    assert!(out.contains("5__"), "first digit not drawn: {out:?}");
    assert!(out.contains("57_"), "second digit not drawn: {out:?}");
    assert!(out.contains("\x1b[13;73H57 "), "final value not repainted: {out:?}");
}

#[test]
fn out_of_range_input_flashes_and_returns_none() {
    let mut port = SimPort::new();
    port.feed(b"\x1b[24;80R");
    port.feed_after(ms(10), b"V");
    port.feed_after(ms(10), b"300\r");
    port.feed_after(ms(10), b"q");

    let mut menu = LevelMenu::new(0, 255);
    drive(&mut port, &mut menu);

    assert_eq!(menu.edits, vec![None]);
    assert_eq!(menu.items.value(0), "42", "a rejected edit must not stick");
    let out = port.output_text();
    assert!(out.contains('\x07'), "out of range deserves a bell");
    assert!(out.contains("XXX"), "cancel flash missing: {out:?}");
}

#[test]
fn ctrl_c_cancels_the_editor() {
    let mut port = SimPort::new();
    port.feed(b"\x1b[24;80R");
    port.feed_after(ms(10), b"V");
    port.feed_after(ms(10), b"\x03");
    port.feed_after(ms(10), b"q");

    let mut menu = LevelMenu::new(0, 255);
    drive(&mut port, &mut menu);

    assert_eq!(menu.edits, vec![None]);
    assert!(port.output_text().contains("XXX"));
}

#[test]
fn a_lone_escape_cancels_the_editor_via_replay() {
    let mut port = SimPort::new();
    port.feed(b"\x1b[24;80R");
    port.feed_after(ms(10), b"V");
    port.feed_after(ms(10), b"\x1b");
    port.feed_after(ms(200), b"q");

    let mut menu = LevelMenu::new(0, 255);
    let code = drive(&mut port, &mut menu);

    assert_eq!(code, 5, "the parent must resume after the cancelled edit");
    assert_eq!(menu.edits, vec![None]);
}

#[test]
fn negative_bounds_switch_to_the_integer_grammar() {
    let mut port = SimPort::new();
    port.feed(b"\x1b[24;80R");
    port.feed_after(ms(10), b"V");
    port.feed_after(ms(10), b"-5\r");
    port.feed_after(ms(10), b"q");

    let mut menu = LevelMenu::new(-99, 99);
    drive(&mut port, &mut menu);

    assert_eq!(menu.edits, vec![Some(-5)]);
    assert_eq!(menu.items.value(0), "-5");
}

#[test]
fn rejected_bytes_ring_the_bell_once_per_run() {
    let mut port = SimPort::new();
    port.feed(b"\x1b[24;80R");
    port.feed_after(ms(10), b"V");
    // Letters never fit the natural grammar; three rapid presses of the
    // same key are one repeat run and ring once.
    port.feed_after(ms(10), b"xxx");
    port.feed_after(ms(10), b"\r");
    port.feed_after(ms(10), b"q");

    let mut menu = LevelMenu::new(0, 255);
    drive(&mut port, &mut menu);

    let bells = port.output().iter().filter(|&&b| b == 0x07).count();
    assert_eq!(bells, 1, "held rejection must not machine-gun the bell");
    // Enter on the empty field counts as a cancel.
    assert_eq!(menu.edits, vec![None]);
}

#[test]
fn framed_input_accepts_a_value() {
    let mut port = SimPort::new();
    port.feed(b"\x1b[24;80R");
    port.feed_after(ms(10), b"8080\r");

    let mut dialog = FramedInput::new("Network", "Port :", 5, Grammar::Natural);
    let code = drive(&mut port, &mut dialog);

    assert_eq!(code, editor::ACCEPTED);
    assert_eq!(dialog.value(), "8080");
    let out = port.output_text();
    assert!(out.contains("Network"), "title missing: {out:?}");
    assert!(out.contains("Port :"), "prompt missing: {out:?}");
    assert!(out.contains("_____"), "empty field missing: {out:?}");
}

#[test]
fn framed_input_cancel_shows_the_banner() {
    let mut port = SimPort::new();
    port.feed(b"\x1b[24;80R");
    port.feed_after(ms(10), b"\x04");

    let mut dialog = FramedInput::new("Network", "Port :", 5, Grammar::Natural);
    let code = {
        let mut console = Console::new(&mut port);
        let code = run(&mut console, &mut dialog).expect("sim port never fails");
        dialog.cancelled(&mut console).expect("sim port never fails");
        code
    };

    assert_eq!(code, editor::CANCELLED);
    assert!(port.output_text().contains("CANCELLED"));
}

#[test]
fn framed_input_floats_over_the_callers_screen() {
    let mut port = SimPort::new();
    port.feed(b"\x1b[24;80R");
    port.feed_after(ms(10), b"8080\r");

    let mut dialog = FramedInput::new("Network", "Port :", 5, Grammar::Natural);
    let code = drive(&mut port, &mut dialog);

    assert_eq!(code, editor::ACCEPTED);
    let out = port.output_text();
    assert!(
        !out.contains("\x1b[2J"),
        "the dialog must not blank the caller's screen: {out:?}"
    );
    // The dialog box blanks its 38 interior columns on every row.
    let interior = format!("|{}|", " ".repeat(38));
    assert!(
        out.contains(&interior),
        "opaque dialog interior missing: {out:?}"
    );
}
