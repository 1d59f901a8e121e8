use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::{ui::state::Route, util::colors};

pub const TITLE: &str = "Music Player";
const PROFILE_HINT: &str = "[p] Profile ";

/// App title on the left, the profile shortcut on the right once signed in.
pub struct TopBar {
    route: Route,
    signed_in: bool,
}

impl TopBar {
    pub fn new(route: Route, signed_in: bool) -> Self {
        Self { route, signed_in }
    }
}

impl Widget for TopBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::new().bg(colors::SECONDARY));
        let [left, right] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(PROFILE_HINT.len() as u16),
        ])
        .areas(area);

        let title = Line::from(vec![
            Span::styled(
                format!(" {TITLE}"),
                Style::new().fg(colors::PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", self.route), Style::new().fg(colors::NEUTRAL)),
        ]);
        Paragraph::new(title).render(left, buf);

        if self.signed_in && self.route != Route::Profile {
            Paragraph::new(Line::from(Span::styled(
                PROFILE_HINT,
                Style::new().fg(colors::ACCENT),
            )))
            .alignment(Alignment::Right)
            .render(right, buf);
        }
    }
}
