use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    symbols::border,
    widgets::{Block, Borders},
};

use crate::{
    ui::{
        app::App,
        components::{toast::Toast, top_bar::TopBar},
    },
    util::colors,
};

pub struct AppLayout<'a> {
    pub app: &'a mut App,
}

impl<'a> AppLayout<'a> {
    pub fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub fn render(self, f: &mut Frame, area: Rect) {
        let buf = f.buffer_mut();
        buf.set_style(area, Style::new().bg(colors::BACKGROUND));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(area);
        let top_area = chunks[0];
        let main_area = chunks[1];

        let route = self.app.router.current_route().unwrap_or_default();
        f.render_widget(TopBar::new(route, self.app.ctx.is_signed_in()), top_area);

        let content_block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::new().fg(colors::NEUTRAL));
        let content_inner = content_block.inner(main_area);
        f.render_widget(content_block, main_area);

        if let Some(view) = self.app.router.active_view() {
            view.render(f, content_inner, &self.app.ctx);
        }

        if let Some(toast) = &self.app.toast {
            f.render_widget(Toast::new(toast), main_area);
        }
    }
}
