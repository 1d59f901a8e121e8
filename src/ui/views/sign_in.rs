use async_trait::async_trait;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::{
    auth::SignInPhase,
    ui::{
        components::spinner::Spinner,
        context::AppContext,
        models::SignInViewModel,
        traits::{Action, View},
    },
    util::colors,
};

const SIGNED_IN: &str = "Sign In Successfully";
const RESTORED: &str = "Welcome back";

pub struct SignIn {
    vm: SignInViewModel,
    resume_session: bool,
}

impl SignIn {
    pub fn new(vm: SignInViewModel) -> Self {
        Self {
            vm,
            resume_session: false,
        }
    }
}

#[async_trait]
impl View for SignIn {
    async fn on_mount(&mut self, _ctx: &AppContext) {
        self.resume_session = self.vm.is_signed_in();
    }

    fn render(&mut self, f: &mut Frame, area: Rect, _ctx: &AppContext) {
        let state = self.vm.state().get();
        let [_, title_area, action_area, detail_area, _] = Layout::vertical([
            Constraint::Percentage(30),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Percentage(20),
        ])
        .areas(area);

        f.render_widget(
            Paragraph::new("Symphony")
                .alignment(Alignment::Center)
                .style(Style::new().fg(colors::PRIMARY).add_modifier(Modifier::BOLD)),
            title_area,
        );

        if state.phase == SignInPhase::Pending {
            f.render_widget(
                Spinner::new()
                    .with_style(Style::new().fg(colors::PRIMARY))
                    .with_label("Waiting for Google sign-in..."),
                action_area,
            );
        } else {
            f.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled("[enter] ", Style::new().fg(colors::ACCENT)),
                    Span::raw("Sign in with Google"),
                ]))
                .alignment(Alignment::Center),
                action_area,
            );
        }

        let detail = if let Some(intent) = self.vm.pending().get() {
            vec![
                Line::from("Open this link in your browser to continue:"),
                Line::styled(intent.authorization_url, Style::new().fg(colors::PRIMARY)),
                Line::styled("[esc] cancel", Style::new().fg(colors::NEUTRAL)),
            ]
        } else if let Some(error) = state.sign_in_error {
            vec![Line::styled(error, Style::new().fg(colors::ERROR))]
        } else {
            Vec::new()
        };
        f.render_widget(
            Paragraph::new(detail)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: false }),
            detail_area,
        );
    }

    async fn handle_input(&mut self, key: KeyEvent, _ctx: &AppContext) -> Option<Action> {
        match key.code {
            KeyCode::Enter => self.vm.sign_in(),
            KeyCode::Esc => self.vm.cancel().await,
            _ => {}
        }
        None
    }

    fn on_tick(&mut self, _ctx: &AppContext) -> Option<Action> {
        if self.vm.take_success() {
            return Some(Action::SignedIn(SIGNED_IN.to_string()));
        }
        if std::mem::take(&mut self.resume_session) {
            return Some(Action::SignedIn(RESTORED.to_string()));
        }
        None
    }
}
