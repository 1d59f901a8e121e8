use std::path::PathBuf;

use async_trait::async_trait;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tokio::sync::watch;

use crate::{
    ui::{
        components::{avatar::Thumbnail, spinner::Spinner},
        context::AppContext,
        models::{ProfileViewModel, profile::AVATAR_SIZE},
        traits::{Action, View},
    },
    util::colors,
};

const AVATAR_WIDTH: u16 = AVATAR_SIZE.0 + 2;
const AVATAR_HEIGHT: u16 = AVATAR_SIZE.1 + 2;

pub struct Profile {
    vm: ProfileViewModel,
    avatar_rx: watch::Receiver<Option<Thumbnail>>,
    thumbnail: Option<Thumbnail>,
    /// Path typed into the "change picture" prompt, while it is open.
    prompt: Option<String>,
}

impl Profile {
    pub fn new(vm: ProfileViewModel) -> Self {
        let avatar_rx = vm.avatar().subscribe();
        Self {
            vm,
            avatar_rx,
            thumbnail: None,
            prompt: None,
        }
    }

    fn refresh_thumbnail(&mut self) {
        if self.avatar_rx.has_changed().unwrap_or(false) {
            self.thumbnail = self.avatar_rx.borrow_and_update().clone();
        }
    }

    fn render_avatar(&self, f: &mut Frame, area: Rect, initial: &str) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::new().fg(colors::NEUTRAL));
        let inner = block.inner(area);
        f.render_widget(block, area);

        match &self.thumbnail {
            Some(thumbnail) => f.render_widget(thumbnail, inner),
            None => f.render_widget(
                Paragraph::new(initial.to_string())
                    .alignment(Alignment::Center)
                    .style(Style::new().fg(colors::PRIMARY).add_modifier(Modifier::BOLD)),
                Rect {
                    y: inner.y + inner.height / 2,
                    height: 1.min(inner.height),
                    ..inner
                },
            ),
        }
    }

    fn submit_prompt(&mut self) {
        let Some(text) = self.prompt.take() else {
            return;
        };
        let path = text.trim().trim_matches(['"', '\'']);
        if !path.is_empty() {
            self.vm.change_picture(PathBuf::from(path));
        }
    }
}

#[async_trait]
impl View for Profile {
    async fn on_mount(&mut self, _ctx: &AppContext) {
        self.vm.on_mount();
    }

    fn render(&mut self, f: &mut Frame, area: Rect, _ctx: &AppContext) {
        self.refresh_thumbnail();

        let user = self.vm.user().get();
        let username = user
            .as_ref()
            .and_then(|u| u.username.clone())
            .unwrap_or_else(|| "Unknown user".to_string());
        let initial = username.chars().next().map(String::from).unwrap_or_default();

        let [avatar_area, details_area] = Layout::horizontal([
            Constraint::Length(AVATAR_WIDTH),
            Constraint::Min(1),
        ])
        .spacing(2)
        .areas(area);
        let avatar_area = Rect {
            height: AVATAR_HEIGHT.min(avatar_area.height),
            ..avatar_area
        };
        self.render_avatar(f, avatar_area, &initial);

        let location = self.vm.readable_location().get();
        let location = if !location.is_empty() {
            location
        } else {
            match self.vm.location().get() {
                Some(fix) => format!("{:.4}, {:.4}", fix.latitude, fix.longitude),
                None => "Unknown".to_string(),
            }
        };

        let mut lines = vec![
            Line::styled(username, Style::new().fg(colors::PRIMARY).add_modifier(Modifier::BOLD)),
            Line::from(""),
            Line::from(vec![
                Span::styled("Your Location: ", Style::new().fg(colors::NEUTRAL)),
                Span::raw(location),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("[c] ", Style::new().fg(colors::ACCENT)),
                Span::raw("Change Profile Picture"),
            ]),
            Line::from(vec![
                Span::styled("[o] ", Style::new().fg(colors::ACCENT)),
                Span::raw("Sign Out"),
            ]),
            Line::from(vec![
                Span::styled("[esc] ", Style::new().fg(colors::ACCENT)),
                Span::raw("Back"),
            ]),
        ];
        if let Some(text) = &self.prompt {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Image path: ", Style::new().fg(colors::PRIMARY)),
                Span::raw(format!("{text}_")),
            ]));
        }
        let [text_area, status_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(details_area);
        f.render_widget(Paragraph::new(lines), text_area);

        if self.vm.uploading().get() {
            f.render_widget(
                Spinner::new()
                    .with_style(Style::new().fg(colors::PRIMARY))
                    .with_label("Uploading..."),
                status_area,
            );
        }
    }

    async fn handle_input(&mut self, key: KeyEvent, _ctx: &AppContext) -> Option<Action> {
        if let Some(text) = &mut self.prompt {
            match key.code {
                KeyCode::Enter => self.submit_prompt(),
                KeyCode::Esc => self.prompt = None,
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Char(c) => text.push(c),
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Char('c') => {
                self.prompt = Some(String::new());
                None
            }
            KeyCode::Char('o') => {
                self.vm.sign_out();
                None
            }
            KeyCode::Esc => Some(Action::Back),
            _ => None,
        }
    }

    fn on_paste(&mut self, text: &str) {
        if let Some(prompt) = &mut self.prompt {
            prompt.push_str(text);
        }
    }

    fn captures_input(&self) -> bool {
        self.prompt.is_some()
    }
}
