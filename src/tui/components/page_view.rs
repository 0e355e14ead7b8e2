//! # PageView Component
//!
//! Renders the anchor's current page in a bordered, scrollable area. The
//! page is a prop; the scroll offset is internal state, reset whenever the
//! anchor shows a different page.

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph, Wrap};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;
use crate::tui::page::Page;

const PAGE_STEP: u16 = 10;

pub struct PageView {
    /// Page on screen (Prop)
    pub page: Option<Arc<Page>>,
    /// First visible line
    scroll: u16,
    /// Line count of the page at the last rendered width
    content_height: u16,
    /// Inner height at the last render
    viewport_height: u16,
}

impl Default for PageView {
    fn default() -> Self {
        Self::new()
    }
}

impl PageView {
    pub fn new() -> Self {
        Self {
            page: None,
            scroll: 0,
            content_height: 0,
            viewport_height: 0,
        }
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn reset_scroll(&mut self) {
        self.scroll = 0;
    }

    fn max_scroll(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = (self.scroll as i32 + delta).clamp(0, self.max_scroll() as i32);
        self.scroll = next as u16;
    }
}

impl Component for PageView {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let Some(page) = self.page.clone() else {
            let placeholder = Paragraph::new("Loading…")
                .block(Block::bordered().border_type(BorderType::Rounded))
                .style(Style::default().add_modifier(Modifier::DIM))
                .alignment(Alignment::Center);
            frame.render_widget(placeholder, area);
            return;
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(format!(" {} ", page.title))
            .title_style(Style::default().fg(Color::Cyan));
        let paragraph = Paragraph::new(page.body.clone()).wrap(Wrap { trim: false });

        let inner_width = area.width.saturating_sub(2);
        self.content_height = paragraph.line_count(inner_width) as u16;
        self.viewport_height = area.height.saturating_sub(2);
        self.scroll = self.scroll.min(self.max_scroll());

        frame.render_widget(paragraph.block(block).scroll((self.scroll, 0)), area);
    }
}

impl EventHandler for PageView {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<()> {
        match event {
            TuiEvent::ScrollUp => self.scroll_by(-1),
            TuiEvent::ScrollDown => self.scroll_by(1),
            TuiEvent::ScrollPageUp => self.scroll_by(-(PAGE_STEP as i32)),
            TuiEvent::ScrollPageDown => self.scroll_by(PAGE_STEP as i32),
            _ => return None,
        }
        Some(())
    }
}
