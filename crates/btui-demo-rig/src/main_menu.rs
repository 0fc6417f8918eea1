#![forbid(unsafe_code)]

//! Top-level screen of the demo rig.

use std::io;
use std::time::Duration;

use btui_console::frame::Frame;
use btui_console::menu::{ItemList, MenuItem};
use btui_console::{Console, Flow, Session, run};
use btui_core::event::KeyEvent;
use tracing::debug;

use crate::bus::RigBus;
use crate::engineering::EngineeringMenu;
use crate::keypress::KeypressViewer;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct MainMenu<'a> {
    bus: &'a mut dyn RigBus,
    frame: Frame,
    items: ItemList,
    heartbeat: bool,
}

impl<'a> MainMenu<'a> {
    #[must_use]
    pub fn new(bus: &'a mut dyn RigBus) -> Self {
        let items = ItemList::new(vec![
            MenuItem::new("E/e     : Engineering menu", 0),
            MenuItem::new("K/k     : Keypress viewer", 0),
            MenuItem::new("Ctrl-b  : Reboot rig (press and hold)", 0),
            MenuItem::new("q       : Quit demo", 0),
        ]);
        let title = format!("Bench rig : Main menu (v{VERSION})");
        Self {
            bus,
            frame: Frame::full_screen(Some(&title)),
            items,
            heartbeat: false,
        }
    }
}

impl Session for MainMenu<'_> {
    fn timer_period(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn redraw(&mut self, console: &mut Console<'_>) -> io::Result<()> {
        let rect = self.frame.draw(console)?;
        self.items.layout(rect, self.frame.has_title());
        self.items.draw_items(console)?;
        self.frame.draw_heartbeat(console, self.heartbeat)
    }

    fn on_key(
        &mut self,
        console: &mut Console<'_>,
        key: KeyEvent,
        _params: &[String],
    ) -> io::Result<Flow> {
        match key.code.as_byte() {
            Some(b'E' | b'e') => {
                debug!("opening engineering menu");
                let mut menu = EngineeringMenu::new(&mut *self.bus);
                run(console, &mut menu)?;
                self.redraw(console)?;
            }
            Some(b'K' | b'k') => {
                debug!("opening keypress viewer");
                let mut viewer = KeypressViewer::new();
                run(console, &mut viewer)?;
                self.redraw(console)?;
            }
            Some(b'q' | b'Q') => return Ok(Flow::Exit(0)),
            _ => {
                if key.is_first() {
                    console.beep()?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn on_disconnect(&mut self, _console: &mut Console<'_>) -> io::Result<Flow> {
        // Stdin does not come back on a host terminal.
        Ok(Flow::Exit(0))
    }

    fn on_timer(&mut self, console: &mut Console<'_>, connected: bool) -> io::Result<Flow> {
        if connected {
            self.heartbeat = !self.heartbeat;
            self.frame.draw_heartbeat(console, self.heartbeat)?;
        }
        Ok(Flow::Continue)
    }
}
