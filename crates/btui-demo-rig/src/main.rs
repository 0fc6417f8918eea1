#![forbid(unsafe_code)]

//! Demo rig binary: the bench-test console served on the local terminal.
//!
//! Runs the same screens the rig firmware ships, backed by a simulated
//! pin bus instead of real hardware. Logs go to stderr and are filtered
//! through `RUST_LOG`; the console itself owns stdout.

mod bus;
mod engineering;
mod keypress;
mod main_menu;

use std::io;
use std::process;

use btui_console::{Console, run};
use btui_port::tty::TtyPort;
use tracing_subscriber::EnvFilter;

use crate::bus::SimBus;
use crate::main_menu::MainMenu;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut port = match TtyPort::new() {
        Ok(port) => port,
        Err(err) => {
            eprintln!("cannot set up the terminal: {err}");
            process::exit(1);
        }
    };

    let mut bus = SimBus::new();
    let outcome = {
        let mut console = Console::new(&mut port);
        let mut menu = MainMenu::new(&mut bus);
        run(&mut console, &mut menu)
    };
    // Leave raw mode before touching stderr or exiting; process::exit
    // skips destructors.
    drop(port);

    match outcome {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("console error: {err}");
            process::exit(1);
        }
    }
}
