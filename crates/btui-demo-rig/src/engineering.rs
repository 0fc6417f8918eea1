#![forbid(unsafe_code)]

//! Engineering screen: raw pin control.
//!
//! Every line of the menu is bound to a slice of the pin register, and
//! every keystroke goes straight to the bus. Values repaint in place;
//! the full screen is only redrawn when the loop asks for it.

use std::io;
use std::time::Duration;

use btui_console::editor::input_value_in_range;
use btui_console::frame::Frame;
use btui_console::menu::{ItemList, MenuItem};
use btui_console::{Console, Flow, Session};
use btui_core::event::{KeyCode, KeyEvent};
use btui_core::style::TextStyle;

use crate::bus::{RigBus, pin};

/// Repeat count at which `+`/`-` switch from steps of 1 to steps of 5.
const FAST_STEP_AFTER: u32 = 15;

/// How long the trigger value stays highlighted after a pulse.
const TRIGGER_FLASH: Duration = Duration::from_millis(100);

const DAC_NAMES: [&str; 4] = ["MAIN", "SCALE", "SPARE", "TRIM"];

const ITEM_ROWCOL: usize = 0;
const ITEM_DAC: usize = 1;
const ITEM_DAC_EN: usize = 4;
const ITEM_DAC_SEL: usize = 5;
const ITEM_DAC_WR: usize = 6;
const ITEM_TRIG: usize = 7;
const ITEM_SPI_CLK: usize = 8;
const ITEM_SPI_ALL_EN: usize = 9;
const ITEM_REGISTER: usize = 10;

pub struct EngineeringMenu<'a> {
    bus: &'a mut dyn RigBus,
    frame: Frame,
    items: ItemList,
    dac: u32,
    row: u32,
    col: u32,
    dac_en: bool,
    dac_sel: u32,
    dac_wr: bool,
    spi_clk: bool,
    spi_all_en: bool,
}

impl<'a> EngineeringMenu<'a> {
    /// A menu mirroring the current state of `bus`.
    pub fn new(bus: &'a mut dyn RigBus) -> Self {
        let all = bus.read_all();
        let dac = (all >> pin::VDAC_BASE) & 0xFF;
        let row = (all >> pin::ROW_A_BASE) & 0xF;
        let col = (all >> pin::COL_A_BASE) & 0xF;
        let dac_en = all & (1 << pin::DAC_EN) != 0;
        let dac_sel = (all >> pin::DAC_SEL_BASE) & 0x3;
        let dac_wr = all & (1 << pin::DAC_WR) != 0;
        let spi_clk = all & (1 << pin::SPI_CLK) != 0;
        let spi_all_en = all & (1 << pin::SPI_ALL_EN) != 0;

        let items = ItemList::new(vec![
            MenuItem::new("Cursors : Change row & column", 3)
                .with_value(rowcol_text(row, col)),
            MenuItem::new("+/-     : Raise/lower DAC value", 3)
                .with_value(dac.to_string()),
            MenuItem::new("V       : Set DAC value", 0),
            MenuItem::new("Z       : Zero DAC value", 0),
            toggle_item("D       : Toggle DAC distribution", dac_en),
            MenuItem::new("S       : Select DAC", 5)
                .with_value(DAC_NAMES[dac_sel as usize]),
            toggle_item("W       : Toggle DAC write enable", dac_wr),
            toggle_item("T       : Pulse trigger", false),
            toggle_item("C       : Toggle SPI clock", spi_clk),
            toggle_item("A       : Toggle SPI all enable", spi_all_en),
            MenuItem::new("Pins    : Raw register state", 10)
                .with_value(register_text(all)),
            MenuItem::new("q       : Exit menu", 0),
        ]);

        Self {
            bus,
            frame: Frame::full_screen(Some("Engineering menu")),
            items,
            dac,
            row,
            col,
            dac_en,
            dac_sel,
            dac_wr,
            spi_clk,
            spi_all_en,
        }
    }

    fn apply_dac(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        self.bus
            .write_masked(0xFF << pin::VDAC_BASE, self.dac << pin::VDAC_BASE);
        self.items
            .set_value(console, ITEM_DAC, self.dac.to_string())?;
        self.update_register(console)
    }

    fn apply_rowcol(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        self.bus
            .write_masked(0xF << pin::ROW_A_BASE, self.row << pin::ROW_A_BASE);
        self.bus
            .write_masked(0xF << pin::COL_A_BASE, self.col << pin::COL_A_BASE);
        self.items
            .set_value(console, ITEM_ROWCOL, rowcol_text(self.row, self.col))?;
        self.update_register(console)
    }

    fn toggle(
        &mut self,
        console: &mut Console<'_>,
        item: usize,
        pin: u32,
        on: bool,
    ) -> io::Result<()> {
        self.bus.write_pin(pin, on);
        self.items
            .set_style(console, item, on.then_some(TextStyle::INVERSE))?;
        self.items
            .set_value(console, item, if on { ">ON<" } else { "off" })?;
        self.update_register(console)
    }

    /// One high-low pulse on the trigger pin, with a short flash of the
    /// menu value so a tap is visible at all.
    fn pulse_trigger(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        self.bus.write_pin(pin::TRIG, true);
        self.bus.write_pin(pin::TRIG, false);
        self.items
            .set_style(console, ITEM_TRIG, Some(TextStyle::INVERSE))?;
        self.items.set_value(console, ITEM_TRIG, ">ON<")?;
        self.update_register(console)?;
        console.flush()?;
        console.sleep(TRIGGER_FLASH);
        self.items.set_style(console, ITEM_TRIG, None)?;
        self.items.set_value(console, ITEM_TRIG, "off")
    }

    fn update_register(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        self.items
            .set_value(console, ITEM_REGISTER, register_text(self.bus.read_all()))
    }
}

fn rowcol_text(row: u32, col: u32) -> String {
    format!("{}{}", (b'A' + row as u8) as char, col)
}

fn register_text(all: u32) -> String {
    format!("0x{all:08X}")
}

fn toggle_item(label: &str, on: bool) -> MenuItem {
    let item = MenuItem::new(label, 4).with_value(if on { ">ON<" } else { "off" });
    if on {
        item.with_style(TextStyle::INVERSE)
    } else {
        item
    }
}

impl Session for EngineeringMenu<'_> {
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
        match key.code {
            KeyCode::Byte(b'+' | b'>') => {
                let step = if key.repeat >= FAST_STEP_AFTER { 5 } else { 1 };
                self.dac = (self.dac + step).min(255);
                self.apply_dac(console)?;
            }
            KeyCode::Byte(b'-' | b'<') => {
                let step = if key.repeat >= FAST_STEP_AFTER { 5 } else { 1 };
                self.dac = self.dac.saturating_sub(step);
                self.apply_dac(console)?;
            }
            KeyCode::Byte(b'Z' | b'z') => {
                self.dac = 0;
                self.apply_dac(console)?;
            }
            KeyCode::Byte(b'V' | b'v') => {
                if let Some(value) = input_value_in_range(console, self, ITEM_DAC, 0, 255)? {
                    self.dac = value as u32;
                }
                // Repaint the cell whether or not the edit went through;
                // a cancelled editor leaves its flash behind.
                self.apply_dac(console)?;
            }
            KeyCode::Up => {
                self.row = self.row.saturating_sub(1);
                self.apply_rowcol(console)?;
            }
            KeyCode::Down => {
                self.row = (self.row + 1).min(15);
                self.apply_rowcol(console)?;
            }
            KeyCode::Left => {
                self.col = self.col.saturating_sub(1);
                self.apply_rowcol(console)?;
            }
            KeyCode::Right => {
                self.col = (self.col + 1).min(15);
                self.apply_rowcol(console)?;
            }
            KeyCode::PageUp => {
                self.row = 0;
                self.apply_rowcol(console)?;
            }
            KeyCode::PageDown => {
                self.row = 15;
                self.apply_rowcol(console)?;
            }
            KeyCode::Home => {
                self.col = 0;
                self.apply_rowcol(console)?;
            }
            KeyCode::End => {
                self.col = 15;
                self.apply_rowcol(console)?;
            }
            KeyCode::Byte(b'D' | b'd') => {
                self.dac_en = !self.dac_en;
                let on = self.dac_en;
                self.toggle(console, ITEM_DAC_EN, pin::DAC_EN, on)?;
            }
            KeyCode::Byte(b'W' | b'w') => {
                self.dac_wr = !self.dac_wr;
                let on = self.dac_wr;
                self.toggle(console, ITEM_DAC_WR, pin::DAC_WR, on)?;
            }
            KeyCode::Byte(b'C' | b'c') => {
                self.spi_clk = !self.spi_clk;
                let on = self.spi_clk;
                self.toggle(console, ITEM_SPI_CLK, pin::SPI_CLK, on)?;
            }
            KeyCode::Byte(b'A' | b'a') => {
                self.spi_all_en = !self.spi_all_en;
                let on = self.spi_all_en;
                self.toggle(console, ITEM_SPI_ALL_EN, pin::SPI_ALL_EN, on)?;
            }
            KeyCode::Byte(b'S' | b's') => {
                self.dac_sel = (self.dac_sel + 1) % 4;
                self.bus.write_masked(
                    0x3 << pin::DAC_SEL_BASE,
                    self.dac_sel << pin::DAC_SEL_BASE,
                );
                self.items
                    .set_value(console, ITEM_DAC_SEL, DAC_NAMES[self.dac_sel as usize])?;
                self.update_register(console)?;
            }
            KeyCode::Byte(b'T' | b't') => {
                self.pulse_trigger(console)?;
            }
            KeyCode::Byte(b'q' | b'Q') => return Ok(Flow::Exit(0)),
            _ => {
                if key.is_first() {
                    console.beep()?;
                }
            }
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SimBus;
    use btui_console::run;
    use btui_port::sim::SimPort;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn drive(port: &mut SimPort, bus: &mut SimBus) -> i32 {
        let mut console = Console::new(port);
        let mut menu = EngineeringMenu::new(bus);
        run(&mut console, &mut menu).expect("sim port never fails")
    }

    #[test]
    fn plus_steps_accelerate_with_repeat() {
        let mut port = SimPort::new();
        port.feed(b"\x1b[24;80R");
        port.feed_after(ms(10), &[b'+'; 16]);
        port.feed_after(ms(10), b"q");

        let mut bus = SimBus::new();
        let code = drive(&mut port, &mut bus);

        assert_eq!(code, 0);
        // Fourteen single steps, then two fast ones.
        assert_eq!((bus.read_all() >> pin::VDAC_BASE) & 0xFF, 24);
    }

    #[test]
    fn editing_the_dac_value_writes_the_bus() {
        let mut port = SimPort::new();
        port.feed(b"\x1b[24;80R");
        port.feed_after(ms(10), b"V");
        port.feed_after(ms(10), b"200\r");
        port.feed_after(ms(10), b"q");

        let mut bus = SimBus::new();
        drive(&mut port, &mut bus);

        assert_eq!((bus.read_all() >> pin::VDAC_BASE) & 0xFF, 200);
    }

    #[test]
    fn trigger_pulse_ends_low() {
        let mut port = SimPort::new();
        port.feed(b"\x1b[24;80R");
        port.feed_after(ms(10), b"T");
        port.feed_after(ms(10), b"q");

        let mut bus = SimBus::new();
        drive(&mut port, &mut bus);

        assert!(!bus.read_pin(pin::TRIG), "pulse must not leave the line high");
        assert!(port.output_text().contains(">ON<"), "flash never drawn");
    }

    #[test]
    fn toggles_flip_their_pins() {
        let mut port = SimPort::new();
        port.feed(b"\x1b[24;80R");
        port.feed_after(ms(10), b"D");
        port.feed_after(ms(10), b"C");
        port.feed_after(ms(10), b"D");
        port.feed_after(ms(10), b"q");

        let mut bus = SimBus::new();
        drive(&mut port, &mut bus);

        assert!(!bus.read_pin(pin::DAC_EN));
        assert!(bus.read_pin(pin::SPI_CLK));
    }

    #[test]
    fn cursor_keys_move_within_bounds() {
        let mut port = SimPort::new();
        port.feed(b"\x1b[24;80R");
        // Up at the top row saturates, then walk down and right, then
        // jump to the bottom row.
        port.feed_after(ms(10), b"\x1b[A");
        port.feed_after(ms(10), b"\x1b[B");
        port.feed_after(ms(10), b"\x1b[C");
        port.feed_after(ms(10), b"\x1b[6~");
        port.feed_after(ms(10), b"q");

        let mut bus = SimBus::new();
        drive(&mut port, &mut bus);

        let all = bus.read_all();
        assert_eq!((all >> pin::ROW_A_BASE) & 0xF, 15);
        assert_eq!((all >> pin::COL_A_BASE) & 0xF, 1);
        assert!(port.output_text().contains("P1"), "cursor value not drawn");
    }

    #[test]
    fn dac_select_cycles_names() {
        let mut port = SimPort::new();
        port.feed(b"\x1b[24;80R");
        port.feed_after(ms(10), b"SS");
        port.feed_after(ms(10), b"q");

        let mut bus = SimBus::new();
        drive(&mut port, &mut bus);

        assert_eq!((bus.read_all() >> pin::DAC_SEL_BASE) & 0x3, 2);
        assert!(port.output_text().contains("SPARE"));
    }
}
