//! # AddressBar Component
//!
//! The terminal's stand-in for a browser location bar.
//!
//! ## Responsibilities
//!
//! - Show the current fragment (decoded, so it reads as JSON)
//! - Edit a single line of text (insert, paste, delete, cursor movement)
//! - Emit `Submit` on Enter and `Cancel` on Esc
//!
//! ## State Management
//!
//! The edit buffer and cursor are internal state. `location` and `editing`
//! are props from the host loop. Long lines scroll horizontally so the
//! cursor stays visible.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// High-level events emitted by the AddressBar
#[derive(Debug, Clone, PartialEq)]
pub enum AddressEvent {
    /// User pressed Enter with this text
    Submit(String),
    /// User abandoned the edit
    Cancel,
    /// Buffer or cursor changed
    Changed,
}

pub struct AddressBar {
    /// What the bar shows when not editing (Prop)
    pub location: String,
    /// Whether keystrokes go to the buffer (Prop)
    pub editing: bool,
    /// Edit buffer (Internal State)
    pub buffer: String,
    /// Cursor as a byte offset into `buffer`
    cursor: usize,
}

impl AddressBar {
    pub fn new() -> Self {
        Self {
            location: String::new(),
            editing: false,
            buffer: String::new(),
            cursor: 0,
        }
    }

    /// Start editing, pre-filled with the current location.
    pub fn begin_edit(&mut self) {
        self.buffer = self.location.clone();
        self.cursor = self.buffer.len();
        self.editing = true;
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.buffer.len())
    }
}

impl Default for AddressBar {
    fn default() -> Self {
        Self::new()
    }
}

/// Slice `text` so the column at byte offset `cursor` fits in `width` columns.
/// Returns the visible text and the cursor's column within it.
fn visible_window(text: &str, cursor: usize, width: u16) -> (String, u16) {
    let width = width as usize;
    if width == 0 {
        return (String::new(), 0);
    }
    let cursor_col: usize = text[..cursor].chars().filter_map(|c| c.width()).sum();
    // Keep one column free for the cursor itself.
    let skip_cols = (cursor_col + 1).saturating_sub(width);

    let mut skipped = 0;
    let mut visible = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if skipped < skip_cols {
            skipped += w;
            continue;
        }
        if used + w > width {
            break;
        }
        used += w;
        visible.push(c);
    }
    (visible, cursor_col.saturating_sub(skipped) as u16)
}

impl Component for AddressBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        // Borders take two columns, the leading '#' one more.
        let text_width = area.width.saturating_sub(3);
        let (title, text, style) = if self.editing {
            (
                "Address (Enter: go, Esc: cancel)",
                &self.buffer,
                Style::default().fg(Color::Green),
            )
        } else {
            (
                "Address (e: edit, Tab: next page, Alt+←: back)",
                &self.location,
                Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            )
        };
        let cursor = if self.editing { self.cursor } else { 0 };
        let (visible, cursor_col) = visible_window(text, cursor, text_width);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(title);
        frame.render_widget(Paragraph::new(format!("#{visible}")).block(block).style(style), area);

        if self.editing {
            // +1 for the border, +1 for the leading '#'
            frame.set_cursor_position((area.x + 2 + cursor_col, area.y + 1));
        }
    }
}

impl EventHandler for AddressBar {
    type Event = AddressEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if !self.editing {
            return None;
        }
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(AddressEvent::Changed)
            }
            TuiEvent::Paste(text) => {
                // Single-line field
                let flat: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
                self.buffer.insert_str(self.cursor, &flat);
                self.cursor += flat.len();
                Some(AddressEvent::Changed)
            }
            TuiEvent::Backspace if self.cursor > 0 => {
                let prev = self.prev_boundary();
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                Some(AddressEvent::Changed)
            }
            TuiEvent::Delete if self.cursor < self.buffer.len() => {
                let next = self.next_boundary();
                self.buffer.drain(self.cursor..next);
                Some(AddressEvent::Changed)
            }
            TuiEvent::CursorLeft if self.cursor > 0 => {
                self.cursor = self.prev_boundary();
                Some(AddressEvent::Changed)
            }
            TuiEvent::CursorRight if self.cursor < self.buffer.len() => {
                self.cursor = self.next_boundary();
                Some(AddressEvent::Changed)
            }
            TuiEvent::Home => {
                self.cursor = 0;
                Some(AddressEvent::Changed)
            }
            TuiEvent::End => {
                self.cursor = self.buffer.len();
                Some(AddressEvent::Changed)
            }
            TuiEvent::Submit => {
                self.editing = false;
                let text = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                Some(AddressEvent::Submit(text.trim().to_string()))
            }
            TuiEvent::Escape => {
                self.editing = false;
                self.buffer.clear();
                self.cursor = 0;
                Some(AddressEvent::Cancel)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing_bar(text: &str) -> AddressBar {
        let mut bar = AddressBar::new();
        bar.location = text.to_string();
        bar.begin_edit();
        bar
    }

    #[test]
    fn test_ignores_input_when_not_editing() {
        let mut bar = AddressBar::new();
        assert_eq!(bar.handle_event(&TuiEvent::InputChar('x')), None);
        assert!(bar.buffer.is_empty());
    }

    #[test]
    fn test_begin_edit_prefills_location() {
        let bar = editing_bar(r#"{"page":"index"}"#);
        assert_eq!(bar.buffer, r#"{"page":"index"}"#);
        assert_eq!(bar.cursor, bar.buffer.len());
    }

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut bar = editing_bar("");
        bar.handle_event(&TuiEvent::InputChar('é'));
        bar.handle_event(&TuiEvent::InputChar('x'));
        bar.handle_event(&TuiEvent::CursorLeft);
        bar.handle_event(&TuiEvent::Backspace);
        assert_eq!(bar.buffer, "x");
        assert_eq!(bar.cursor, 0);
    }

    #[test]
    fn test_delete_at_cursor() {
        let mut bar = editing_bar("abc");
        bar.handle_event(&TuiEvent::Home);
        bar.handle_event(&TuiEvent::Delete);
        assert_eq!(bar.buffer, "bc");
        bar.handle_event(&TuiEvent::End);
        assert_eq!(bar.handle_event(&TuiEvent::Delete), None);
    }

    #[test]
    fn test_paste_strips_newlines() {
        let mut bar = editing_bar("");
        bar.handle_event(&TuiEvent::Paste("{\"page\":\n\"about\"}".to_string()));
        assert_eq!(bar.buffer, "{\"page\":\"about\"}");
    }

    #[test]
    fn test_submit_returns_trimmed_text_and_stops_editing() {
        let mut bar = editing_bar("  {\"page\":\"a\"}  ");
        let event = bar.handle_event(&TuiEvent::Submit);
        assert_eq!(event, Some(AddressEvent::Submit("{\"page\":\"a\"}".to_string())));
        assert!(!bar.editing);
        assert!(bar.buffer.is_empty());
    }

    #[test]
    fn test_escape_cancels() {
        let mut bar = editing_bar("draft");
        assert_eq!(bar.handle_event(&TuiEvent::Escape), Some(AddressEvent::Cancel));
        assert!(!bar.editing);
        assert!(bar.buffer.is_empty());
    }

    #[test]
    fn test_visible_window_scrolls_to_cursor() {
        let (visible, col) = visible_window("abcdefghij", 10, 5);
        assert_eq!(visible, "ghij");
        assert_eq!(col, 4);

        let (visible, col) = visible_window("abcdefghij", 0, 5);
        assert_eq!(visible, "abcde");
        assert_eq!(col, 0);
    }

    #[test]
    fn test_visible_window_counts_wide_chars() {
        let (_, col) = visible_window("日本", 6, 10);
        assert_eq!(col, 4);
    }
}
