//! Markdown → ratatui `Text` renderer for pages.
//!
//! Converts `pulldown_cmark` events into styled `Line`/`Span` values:
//! headings, emphasis, inline code, fenced code blocks, lists, blockquotes,
//! rules and links. The first level-one heading doubles as the page title.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

/// A rendered markdown document.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    /// Text of the first `#` heading, if any.
    pub title: Option<String>,
    pub text: Text<'static>,
}

/// Parse markdown content into styled `Text`.
pub fn render(content: &str, base_fg: Color) -> Rendered {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    let mut w = Writer::new(base_fg);
    for event in Parser::new_ext(content, opts) {
        w.handle(event);
    }
    Rendered {
        title: w.title,
        text: w.text,
    }
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer {
    text: Text<'static>,
    base_fg: Color,
    /// Inline style stack; nested styles compose via `patch`.
    styles: Vec<Style>,
    /// Per-line prefix spans (blockquote and code block borders).
    line_prefixes: Vec<Span<'static>>,
    /// List nesting: None = unordered, Some(n) = ordered at index n.
    list_indices: Vec<Option<u64>>,
    in_code_block: bool,
    link_url: Option<String>,
    needs_newline: bool,
    title: Option<String>,
    /// Collects heading text while inside the first H1.
    title_buffer: Option<String>,
}

impl Writer {
    fn new(base_fg: Color) -> Self {
        Self {
            text: Text::default(),
            base_fg,
            styles: vec![],
            line_prefixes: vec![],
            list_indices: vec![],
            in_code_block: false,
            link_url: None,
            needs_newline: false,
            title: None,
            title_buffer: None,
        }
    }

    fn style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    fn push_line(&mut self, line: Line<'static>) {
        let mut out = line;
        for pfx in self.line_prefixes.iter().rev().cloned() {
            out.spans.insert(0, pfx);
        }
        self.text.lines.push(out);
    }

    fn push_span(&mut self, span: Span<'static>) {
        match self.text.lines.last_mut() {
            Some(line) => line.push_span(span),
            None => self.push_line(Line::from(vec![span])),
        }
    }

    fn start_block(&mut self) {
        if self.needs_newline {
            self.push_line(Line::default());
            self.needs_newline = false;
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) => self.text(t),
            Event::Code(c) => {
                let style = Style::default().fg(Color::White).bg(Color::DarkGray);
                self.capture_title(&c);
                self.push_span(Span::styled(c.to_string(), style));
            }
            Event::SoftBreak => self.push_span(Span::raw(" ")),
            Event::HardBreak => self.push_line(Line::default()),
            Event::Rule => {
                self.start_block();
                self.push_line(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(Color::DarkGray),
                )));
                self.needs_newline = true;
            }
            _ => {} // HTML, footnotes, task markers
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.start_block();
                self.push_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                if level == HeadingLevel::H1 && self.title.is_none() {
                    self.title_buffer = Some(String::new());
                }
                let style = heading_style(self.base_fg, level);
                self.push_line(Line::default());
                self.push_style(style);
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.line_prefixes
                    .push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
                self.push_style(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.start_block();
                let border = Style::default().fg(Color::DarkGray);
                let top = match &kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Line::from(vec![
                        Span::styled("╭── ", border),
                        Span::styled(lang.to_string(), border.add_modifier(Modifier::BOLD)),
                    ]),
                    _ => Line::from(Span::styled("╭──", border)),
                };
                self.push_line(top);
                self.line_prefixes.push(Span::styled("│ ", border));
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.list_indices.is_empty() {
                    self.start_block();
                }
                self.list_indices.push(start);
            }
            Tag::Item => {
                self.push_line(Line::default());
                let indent = "  ".repeat(self.list_indices.len().saturating_sub(1));
                let marker = match self.list_indices.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.push_span(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link_url = Some(dest_url.to_string());
                self.push_style(link_style());
            }
            _ => {} // Tables, images
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.needs_newline = true,
            TagEnd::Heading(_) => {
                self.pop_style();
                if let Some(title) = self.title_buffer.take() {
                    self.title = Some(title.trim().to_string());
                }
                self.needs_newline = true;
            }
            TagEnd::BlockQuote(_) => {
                self.line_prefixes.pop();
                self.pop_style();
                self.needs_newline = true;
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.line_prefixes.pop();
                self.push_line(Line::from(Span::styled(
                    "╰──",
                    Style::default().fg(Color::DarkGray),
                )));
                self.needs_newline = true;
            }
            TagEnd::List(_) => {
                self.list_indices.pop();
                self.needs_newline = true;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_url.take() {
                    self.push_span(Span::raw(" <"));
                    self.push_span(Span::styled(url, link_style()));
                    self.push_span(Span::raw(">"));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, cow: CowStr<'_>) {
        // ratatui renders \t as zero-width
        let text = cow.replace('\t', "    ");

        if self.in_code_block {
            let code_style = Style::default().fg(Color::White);
            for line in text.lines() {
                self.push_line(Line::from(Span::styled(line.to_owned(), code_style)));
            }
            return;
        }

        self.capture_title(&text);
        let style = self.style();
        self.push_span(Span::styled(text, style));
    }

    fn capture_title(&mut self, fragment: &str) {
        if let Some(buffer) = self.title_buffer.as_mut() {
            buffer.push_str(fragment);
        }
    }
}

fn link_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::UNDERLINED)
}

fn heading_style(base_fg: Color, level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => Style::default().fg(base_fg).add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_lines(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn first_h1_becomes_title() {
        let rendered = render("# Getting `started`\n\ntext\n\n# Second", Color::White);
        assert_eq!(rendered.title.as_deref(), Some("Getting started"));
    }

    #[test]
    fn no_h1_means_no_title() {
        let rendered = render("## Only a subheading", Color::White);
        assert!(rendered.title.is_none());
    }

    #[test]
    fn heading_text_is_bold() {
        let rendered = render("## Hello", Color::Blue);
        let span = rendered.text.lines[0]
            .spans
            .iter()
            .find(|s| s.content == "Hello")
            .unwrap();
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(span.style.fg, Some(Color::Blue));
    }

    #[test]
    fn emphasis_nests() {
        let rendered = render("***both***", Color::Blue);
        let span = rendered.text.lines[0]
            .spans
            .iter()
            .find(|s| s.content == "both")
            .unwrap();
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
        assert!(span.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn code_block_is_framed() {
        let rendered = render("```rust\nfn main() {}\n```", Color::Blue);
        let lines = plain_lines(&rendered.text);
        assert!(lines[0].starts_with("╭── rust"));
        assert_eq!(lines[1], "│ fn main() {}");
        assert!(lines.last().unwrap().starts_with('╰'));
    }

    #[test]
    fn ordered_list_counts_up() {
        let rendered = render("3. three\n4. four", Color::Blue);
        let lines = plain_lines(&rendered.text);
        assert!(lines.iter().any(|l| l == "3. three"));
        assert!(lines.iter().any(|l| l == "4. four"));
    }

    #[test]
    fn link_shows_target() {
        let rendered = render("[About](#about)", Color::Blue);
        let lines = plain_lines(&rendered.text);
        assert_eq!(lines[0], "About <#about>");
    }

    #[test]
    fn tabs_expanded_in_code() {
        let rendered = render("```\n\tindented\n```", Color::Blue);
        let lines = plain_lines(&rendered.text);
        assert!(lines.iter().any(|l| l.contains("    indented")));
        assert!(!lines.iter().any(|l| l.contains('\t')));
    }
}
