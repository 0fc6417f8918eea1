#![forbid(unsafe_code)]

//! Menu item layout.
//!
//! An [`ItemList`] lays a column of labeled items out inside a frame
//! rectangle: labels on the left, values right-aligned against the frame
//! edge, a dot leader bridging the two. Layout is recomputed from the
//! frame rectangle on every redraw; in between, individual values are
//! repainted in place without touching the rest of the screen.
//!
//! # Design Notes
//!
//! - Items are double-spaced when the frame is tall enough, single-spaced
//!   otherwise, and truncated as a last resort.
//! - The value column is reserved from the widest declared value, but each
//!   value pads only to its own declared width, so a shrinking value
//!   erases its own leftovers and nothing else.

use std::io;

use btui_core::geometry::Rect;
use btui_core::style::TextStyle;
use unicode_width::UnicodeWidthStr;

use crate::console::Console;

/// Margin between the frame border and the label column, at most.
const SIDE_MARGIN: u16 = 5;

/// One menu line: a label and an optional right-aligned value slot.
#[derive(Debug, Clone)]
pub struct MenuItem {
    label: String,
    value_width: u16,
    value: String,
    style: Option<TextStyle>,
}

impl MenuItem {
    /// An item with a value slot of `value_width` columns. Zero means a
    /// plain label line with no value and no dot leader.
    #[must_use]
    pub fn new(label: impl Into<String>, value_width: u16) -> Self {
        Self {
            label: label.into(),
            value_width,
            value: String::new(),
            style: None,
        }
    }

    /// Same, with an initial value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Same, with an initial value style.
    #[must_use]
    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = Some(style);
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A laid-out column of menu items.
#[derive(Debug, Clone, Default)]
pub struct ItemList {
    items: Vec<MenuItem>,
    visible: usize,
    pitch: u16,
    label_width: u16,
    value_width: u16,
    first_row: u16,
    label_col: u16,
    value_col: u16,
}

impl ItemList {
    #[must_use]
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items drawn after the last layout; the tail of the list is dropped
    /// when the frame cannot hold everything.
    #[must_use]
    pub fn visible(&self) -> usize {
        self.visible
    }

    /// Current value text of an item.
    #[must_use]
    pub fn value(&self, index: usize) -> &str {
        self.items[index].value()
    }

    /// Screen cell where the value of `index` starts, if that item has a
    /// value slot and survived truncation. Valid until the next layout.
    #[must_use]
    pub fn value_cell(&self, index: usize) -> Option<(u16, u16)> {
        let item = self.items.get(index)?;
        if index >= self.visible || item.value_width == 0 {
            return None;
        }
        Some((self.first_row + index as u16 * self.pitch, self.value_col))
    }

    /// Compute item positions for a frame rectangle.
    ///
    /// `titled` frames start the items two rows lower to leave room for
    /// the title line.
    pub fn layout(&mut self, frame: Rect, titled: bool) {
        let count = self.items.len() as u16;
        let top = if titled { 4 } else { 2 };

        self.value_width = self.items.iter().map(|i| i.value_width).max().unwrap_or(0);
        let widest_label = self
            .items
            .iter()
            .map(|i| i.label.width() as u16)
            .max()
            .unwrap_or(0);
        self.label_width =
            widest_label.min(frame.width.saturating_sub(self.value_width + 6));

        let (pitch, height, visible) = if count.saturating_mul(2) + top + 1 < frame.height {
            (2, count.saturating_mul(2).saturating_sub(1), count)
        } else {
            let fit = frame.height.saturating_sub(top + 2).min(count);
            (1, fit, fit)
        };
        self.pitch = pitch;
        self.visible = usize::from(visible);

        let slack = frame.height.saturating_sub(height + top + 2);
        self.first_row = frame.row + top + slack / 2;

        let margin = SIDE_MARGIN.min(
            frame
                .width
                .saturating_sub((self.label_width + self.value_width + 6) / 2),
        );
        self.label_col = frame.col + margin;
        self.value_col = (frame.col + frame.width)
            .saturating_sub(self.value_width + margin);
    }

    /// Draw every visible item.
    pub fn draw_items(&self, console: &mut Console<'_>) -> io::Result<()> {
        for index in 0..self.visible {
            self.draw_item(console, index)?;
        }
        Ok(())
    }

    /// Draw one item line: label, dot leader, value.
    pub fn draw_item(&self, console: &mut Console<'_>, index: usize) -> io::Result<()> {
        if index >= self.visible {
            return Ok(());
        }
        let item = &self.items[index];
        let row = self.first_row + index as u16 * self.pitch;
        console.move_to(row, self.label_col)?;
        if item.value_width == 0 {
            // Plain label; it may spill into the value column.
            return console.put_clipped(
                &item.label,
                self.label_width + self.value_width + 2,
                false,
            );
        }
        console.put_clipped(&item.label, self.label_width, false)?;
        console.put(" ")?;
        let drawn = (item.label.width() as u16).min(self.label_width);
        let leader_start = self.label_col + drawn + 1;
        for _ in leader_start..self.value_col.saturating_sub(1) {
            console.put(".")?;
        }
        console.put(" ")?;
        self.draw_value(console, index)
    }

    /// Repaint just the value of one item.
    pub fn draw_value(&self, console: &mut Console<'_>, index: usize) -> io::Result<()> {
        let Some((row, col)) = self.value_cell(index) else {
            return Ok(());
        };
        let item = &self.items[index];
        console.move_to(row, col)?;
        match item.style {
            Some(style) => console.put_styled(&item.value, style, item.value_width, true),
            None => console.put_clipped(&item.value, item.value_width, true),
        }
    }

    /// Update a value and repaint it in place.
    pub fn set_value(
        &mut self,
        console: &mut Console<'_>,
        index: usize,
        value: impl Into<String>,
    ) -> io::Result<()> {
        self.items[index].value = value.into();
        self.draw_value(console, index)
    }

    /// Update a value's style (None for plain) and repaint it in place.
    pub fn set_style(
        &mut self,
        console: &mut Console<'_>,
        index: usize,
        style: Option<TextStyle>,
    ) -> io::Result<()> {
        self.items[index].style = style;
        self.draw_value(console, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btui_port::sim::SimPort;

    fn sample() -> ItemList {
        ItemList::new(vec![
            MenuItem::new("Alpha", 3).with_value("42"),
            MenuItem::new("Br", 0),
            MenuItem::new("Gamma row", 2).with_value("ok"),
        ])
    }

    #[test]
    fn tall_frames_double_space_and_center() {
        let mut list = sample();
        list.layout(Rect::new(0, 0, 24, 80), false);
        assert_eq!(list.visible(), 3);
        // Items occupy 5 rows; slack (24 - 5 - 2 - 2) = 15 centers them
        // 7 rows below the first candidate row.
        assert_eq!(list.value_cell(0), Some((9, 72)));
        assert_eq!(list.value_cell(2), Some((13, 72)));
    }

    #[test]
    fn label_only_items_have_no_value_cell() {
        let mut list = sample();
        list.layout(Rect::new(0, 0, 24, 80), false);
        assert_eq!(list.value_cell(1), None);
    }

    #[test]
    fn short_frames_single_space() {
        let mut list = sample();
        list.layout(Rect::new(0, 0, 8, 80), false);
        assert_eq!(list.visible(), 3);
        assert_eq!(list.value_cell(0), Some((2, 72)));
        assert_eq!(list.value_cell(2), Some((4, 72)));
    }

    #[test]
    fn too_short_frames_truncate_the_tail() {
        let mut list = sample();
        list.layout(Rect::new(0, 0, 6, 80), false);
        assert_eq!(list.visible(), 2);
        assert_eq!(list.value_cell(2), None);
    }

    #[test]
    fn titled_frames_start_items_lower() {
        let mut list = sample();
        list.layout(Rect::new(0, 0, 24, 80), true);
        // Top offset 4, item height 5, slack (24 - 5 - 4 - 2) = 13.
        assert_eq!(list.value_cell(0), Some((10, 72)));
    }

    #[test]
    fn items_draw_with_dot_leaders() {
        let mut list = sample();
        let mut port = SimPort::new();
        {
            let mut console = Console::new(&mut port);
            list.layout(Rect::new(0, 0, 24, 80), false);
            list.draw_items(&mut console).unwrap();
        }
        let out = port.output_text();
        // Label at column 5, leader to the value column at 72.
        assert!(out.contains("\x1b[10;6HAlpha "), "label misplaced: {out:?}");
        assert!(out.contains(&format!("{} ", ".".repeat(60))), "leader wrong: {out:?}");
        assert!(out.contains("\x1b[10;73H42 "), "value misplaced: {out:?}");
        // The label-only line draws no leader after it.
        assert!(out.contains("\x1b[12;6HBr\x1b["), "plain label wrong: {out:?}");
    }

    #[test]
    fn set_value_repaints_in_place() {
        let mut list = sample();
        let mut port = SimPort::new();
        {
            let mut console = Console::new(&mut port);
            list.layout(Rect::new(0, 0, 24, 80), false);
            list.set_value(&mut console, 0, "7").unwrap();
        }
        assert_eq!(port.output_text(), "\x1b[10;73H7  ");
        assert_eq!(list.value(0), "7");
    }

    #[test]
    fn styled_values_draw_inside_save_restore() {
        let mut list = sample();
        let mut port = SimPort::new();
        {
            let mut console = Console::new(&mut port);
            list.layout(Rect::new(0, 0, 24, 80), false);
            list.set_style(&mut console, 0, Some(TextStyle::INVERSE)).unwrap();
        }
        assert_eq!(port.output_text(), "\x1b[10;73H\x1b7\x1b[7m42 \x1b8");
    }

    #[test]
    fn narrow_frames_cap_the_label_column() {
        let mut list = ItemList::new(vec![
            MenuItem::new("An unreasonably long label", 4).with_value("1"),
        ]);
        list.layout(Rect::new(0, 0, 24, 20), false);
        // Label budget is width - value_width - 6.
        let mut port = SimPort::new();
        {
            let mut console = Console::new(&mut port);
            list.draw_items(&mut console).unwrap();
        }
        let out = port.output_text();
        assert!(out.contains("An unreaso"), "cap missing: {out:?}");
        assert!(!out.contains("An unreasonab"));
    }
}
