//! Frame chrome: border box, title and connection heartbeat.
//!
//! A [`Frame`] resolves its rectangle against the console's current
//! geometry on every draw, so a `ctrl-l` after resizing the terminal is
//! all it takes to re-center everything.

use std::io;

use btui_core::geometry::{Anchor, Rect, ScreenSize};
use unicode_width::UnicodeWidthStr;

use crate::console::Console;

/// Heartbeat indicator, drawn on the bottom border near the right corner.
const HEART_ON: &str = "<3";
const HEART_OFF: &str = "--";

/// A bordered frame with an optional centered title.
#[derive(Debug, Clone)]
pub struct Frame {
    title: Option<String>,
    req_height: u16,
    req_width: u16,
    anchor: Anchor,
    clear_on_redraw: bool,
    rect: Rect,
    title_fits: bool,
}

impl Frame {
    /// A frame of the requested size. A zero height or width means "use
    /// the whole screen" in that direction.
    #[must_use]
    pub fn new(title: Option<&str>, height: u16, width: u16, anchor: Anchor) -> Self {
        Self {
            title: title.map(str::to_owned),
            req_height: height,
            req_width: width,
            anchor,
            clear_on_redraw: true,
            rect: Rect::default(),
            title_fits: false,
        }
    }

    /// A frame covering the whole screen.
    #[must_use]
    pub fn full_screen(title: Option<&str>) -> Self {
        Self::new(title, 0, 0, Anchor::Center)
    }

    /// Whether [`Frame::draw`] clears the screen first. On by default;
    /// dialogs that draw over a parent turn it off.
    #[must_use]
    pub fn with_clear_on_redraw(mut self, clear: bool) -> Self {
        self.clear_on_redraw = clear;
        self
    }

    #[must_use]
    pub fn has_title(&self) -> bool {
        self.title.is_some()
    }

    /// Rectangle resolved at the last layout or draw.
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Whether the full title fit inside the frame on the last draw.
    #[must_use]
    pub fn title_fits(&self) -> bool {
        self.title_fits
    }

    /// Resolve the frame rectangle against a screen size.
    pub fn layout(&mut self, screen: ScreenSize) -> Rect {
        let height = if self.req_height == 0 {
            screen.rows
        } else {
            self.req_height
        };
        let width = if self.req_width == 0 {
            screen.cols
        } else {
            self.req_width
        };
        self.rect = self.anchor.place(height, width, screen);
        self.rect
    }

    /// Lay out and draw the frame; returns the resolved rectangle so the
    /// caller can place its contents.
    pub fn draw(&mut self, console: &mut Console<'_>) -> io::Result<Rect> {
        self.layout(console.screen());
        if self.clear_on_redraw {
            console.clear_screen()?;
        }
        console.draw_box(self.rect)?;
        self.title_fits = self.draw_title(console)?;
        Ok(self.rect)
    }

    /// Centered title two rows below the top border. Frames smaller than
    /// 5x5 skip the title entirely.
    fn draw_title(&mut self, console: &mut Console<'_>) -> io::Result<bool> {
        let Some(title) = &self.title else {
            return Ok(false);
        };
        if self.rect.height < 5 || self.rect.width < 5 {
            return Ok(false);
        }
        let budget = self.rect.width - 4;
        let width = (title.width() as u16).min(budget);
        console.move_to(self.rect.row + 2, self.rect.col + (self.rect.width - width) / 2)?;
        console.put_clipped(title, width, false)?;
        Ok(title.width() as u16 <= budget)
    }

    /// Draw the connection heartbeat onto the bottom border. The off
    /// glyph matches the border so an idle heartbeat disappears into it.
    pub fn draw_heartbeat(&self, console: &mut Console<'_>, on: bool) -> io::Result<()> {
        if self.rect.height < 2 || self.rect.width < 6 {
            return Ok(());
        }
        console.move_to(self.rect.bottom() - 1, self.rect.right() - 4)?;
        console.put(if on { HEART_ON } else { HEART_OFF })
    }
}
