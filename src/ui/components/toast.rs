use std::time::{Duration, Instant};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    symbols::border,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::util::colors;

/// A transient message shown in the bottom right corner.
#[derive(Debug, Clone)]
pub struct ToastMessage {
    pub text: String,
    expires_at: Instant,
}

impl ToastMessage {
    pub fn new(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            expires_at: Instant::now() + duration,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

pub struct Toast<'a> {
    message: &'a ToastMessage,
}

impl<'a> Toast<'a> {
    pub fn new(message: &'a ToastMessage) -> Self {
        Self { message }
    }

    /// Box hugging the text, anchored to the bottom right of `area`.
    pub fn area(&self, area: Rect) -> Rect {
        let width = (self.message.text.chars().count() as u16 + 4).min(area.width);
        let height = 3.min(area.height);
        Rect {
            x: area.x + area.width - width,
            y: area.y + area.height - height,
            width,
            height,
        }
    }
}

impl Widget for Toast<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = self.area(area);
        Clear.render(area, buf);
        Paragraph::new(format!(" {}", self.message.text))
            .style(Style::new().fg(colors::ACCENT).bg(colors::BACKGROUND))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_set(border::ROUNDED)
                    .border_style(Style::new().fg(colors::ACCENT)),
            )
            .render(area, buf);
    }
}
