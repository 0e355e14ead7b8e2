//! # TitleBar Component
//!
//! Top status line: page title, cache size, transient status, and a warning
//! when the committed state and the page on screen disagree (a transition
//! failed after its state was committed).
//!
//! Stateless: every field is a prop, so the host rebuilds it each frame.
//!
//! 1. **Out of sync**: `"Waypoint | Welcome | 3 cached | Loading… | ⚠ view out of sync"`
//! 2. **Status message**: `"Waypoint | Welcome | 3 cached | Loading…"`
//! 3. **Default**: `"Waypoint | Welcome | 3 cached"`

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

pub struct TitleBar {
    /// Title of the page on screen (empty before the first page)
    pub page_title: String,
    /// Views built so far
    pub cached: usize,
    /// Transient status (e.g. "Loading about…", "Fragment ignored")
    pub status_message: String,
    /// Committed state routes somewhere other than the page on screen
    pub out_of_sync: bool,
}

impl TitleBar {
    pub fn new(page_title: String, cached: usize, status_message: String, out_of_sync: bool) -> Self {
        Self {
            page_title,
            cached,
            status_message,
            out_of_sync,
        }
    }

    fn text(&self) -> String {
        let mut parts = vec!["Waypoint".to_string()];
        if !self.page_title.is_empty() {
            parts.push(self.page_title.clone());
        }
        parts.push(format!("{} cached", self.cached));
        if !self.status_message.is_empty() {
            parts.push(self.status_message.clone());
        }
        parts.join(" | ")
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(self.text())];
        if self.out_of_sync {
            spans.push(Span::styled(
                " | ⚠ view out of sync",
                Style::default().fg(Color::Yellow),
            ));
        }
        frame.render_widget(Line::from(spans), area);
    }
}
