use std::time::Duration;

use flume::{Receiver, Sender};
use ratatui::Frame;
use tracing::info;

use crate::{config::AppConfig, event::events::Event};

use super::{
    components::toast::ToastMessage,
    context::AppContext,
    layout::AppLayout,
    router::{PopUpTo, Router},
    state::Route,
    traits::View,
    tui::{self, TerminalEvent},
    util::handler::EventHandler,
};

pub struct App {
    pub event_rx: Receiver<Event>,
    pub event_tx: Sender<Event>,
    pub ctx: AppContext,
    pub router: Router<Box<dyn View>>,
    pub toast: Option<ToastMessage>,
    pub toast_duration: Duration,
    pub has_focus: bool,
    pub should_quit: bool,
}

impl App {
    pub async fn new(config: AppConfig) -> color_eyre::Result<Self> {
        let (event_tx, event_rx) = flume::unbounded();
        let ctx = AppContext::new(&config, event_tx.clone());
        let router = Router::new(Route::SignIn, ctx.build_view(Route::SignIn));

        Ok(Self {
            event_rx,
            event_tx,
            ctx,
            router,
            toast: None,
            toast_duration: config.toast_duration,
            has_focus: true,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut tui = tui::Tui::new()?.paste(true);
        tui.enter()?;

        EventHandler::handle_event(self, TerminalEvent::Init, &mut tui).await?;
        while !self.should_quit {
            tui.draw(|f| {
                self.ui(f);
            })?;

            EventHandler::handle_events(self, &mut tui).await?;
        }

        tui.exit()?;
        Ok(())
    }

    /// Mounts a fresh view for `route` before it replaces whatever
    /// `pop_up_to` removes.
    pub async fn navigate(&mut self, route: Route, pop_up_to: Option<PopUpTo>) {
        let mut view = self.ctx.build_view(route);
        view.on_mount(&self.ctx).await;
        self.router.navigate(route, view, pop_up_to);
        info!(route = route.as_str(), depth = self.router.depth(), "navigated");
    }

    pub fn show_toast(&mut self, text: impl Into<String>) {
        self.toast = Some(ToastMessage::new(text, self.toast_duration));
    }

    fn ui(&mut self, frame: &mut Frame) {
        if self.has_focus {
            let area = frame.area();
            AppLayout::new(self).render(frame, area);
        }
    }
}
