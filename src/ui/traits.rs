use async_trait::async_trait;
use ratatui::crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};

use crate::ui::{context::AppContext, state::Route};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Navigate(Route),
    Back,
    /// Sign-in finished; the text is shown as a toast.
    SignedIn(String),
}

#[async_trait]
pub trait View: Send {
    async fn on_mount(&mut self, _ctx: &AppContext) {}

    fn render(&mut self, f: &mut Frame, area: Rect, ctx: &AppContext);

    async fn handle_input(&mut self, key: KeyEvent, ctx: &AppContext) -> Option<Action>;

    /// Polled on every tick for effects driven by observable state.
    fn on_tick(&mut self, _ctx: &AppContext) -> Option<Action> {
        None
    }

    fn on_paste(&mut self, _text: &str) {}

    /// True while a text prompt has focus, so global shortcuts stay quiet.
    fn captures_input(&self) -> bool {
        false
    }
}
