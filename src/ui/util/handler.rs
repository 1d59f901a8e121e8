use std::time::Instant;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use crate::{
    event::events::Event,
    ui::{
        app::App,
        input::InputHandler,
        router::PopUpTo,
        state::Route,
        traits::Action,
        tui::{TerminalEvent, Tui},
    },
};

pub struct EventHandler;

impl EventHandler {
    pub async fn handle_events(app: &mut App, tui: &mut Tui) -> color_eyre::Result<bool> {
        let mut should_render = false;
        if let Some(evt) = tui.next().await {
            if Self::handle_event(app, evt, tui).await? {
                should_render = true;
            }
        }

        while let Ok(evt) = app.event_rx.try_recv() {
            Self::handle_action(app, evt).await;
            should_render = true;
        }

        Ok(should_render)
    }

    pub async fn handle_event(
        app: &mut App,
        evt: TerminalEvent,
        tui: &mut Tui,
    ) -> color_eyre::Result<bool> {
        match evt {
            TerminalEvent::Init => {
                if let Some(view) = app.router.active_view() {
                    view.on_mount(&app.ctx).await;
                }
            }
            TerminalEvent::Quit => app.should_quit = true,
            TerminalEvent::FocusGained => {
                app.has_focus = true;
                tui.clear()?;
            }
            TerminalEvent::FocusLost => app.has_focus = false,
            TerminalEvent::Key(key) => Self::handle_key_event(app, key).await,
            TerminalEvent::Paste(text) => {
                if let Some(view) = app.router.active_view() {
                    view.on_paste(&text);
                }
            }
            TerminalEvent::Tick => {
                Self::handle_tick(app).await;
                return Ok(app.has_focus);
            }
            _ => {}
        }

        Ok(true)
    }

    pub async fn handle_action(app: &mut App, evt: Event) {
        match evt {
            Event::Toast(text) => app.show_toast(text),
            Event::SignedOut => {
                info!("navigating_after_sign_out");
                app.navigate(Route::SignIn, Some(PopUpTo::All)).await;
            }
        }
    }

    async fn handle_tick(app: &mut App) {
        if app.toast.as_ref().is_some_and(|t| t.is_expired(Instant::now())) {
            app.toast = None;
        }

        let action = match app.router.active_view() {
            Some(view) => view.on_tick(&app.ctx),
            None => None,
        };
        if let Some(action) = action {
            Self::dispatch_action(app, action).await;
        }
    }

    async fn handle_key_event(app: &mut App, evt: KeyEvent) {
        if evt.kind != KeyEventKind::Press {
            return;
        }
        if evt.code == KeyCode::Char('c') && evt.modifiers == KeyModifiers::CONTROL {
            app.should_quit = true;
            return;
        }

        let (action, captured) = match app.router.active_view() {
            Some(view) => {
                let captured = view.captures_input();
                (view.handle_input(evt, &app.ctx).await, captured)
            }
            None => (None, false),
        };

        if let Some(action) = action {
            Self::dispatch_action(app, action).await;
            return;
        }
        if captured {
            return;
        }

        let route = app.router.current_route().unwrap_or_default();
        if let Some(action) = InputHandler::handle_key(evt, route, app.ctx.is_signed_in()) {
            Self::dispatch_action(app, action).await;
        }
    }

    async fn dispatch_action(app: &mut App, action: Action) {
        debug!(?action, "dispatch_action");
        match action {
            Action::Quit => app.should_quit = true,
            Action::Navigate(route) => {
                if app.router.current_route() != Some(route) {
                    app.navigate(route, None).await;
                }
            }
            Action::Back => {
                app.router.pop();
            }
            Action::SignedIn(text) => {
                app.show_toast(text);
                app.navigate(
                    Route::MusicDisplay,
                    Some(PopUpTo::Route {
                        route: Route::SignIn,
                        inclusive: true,
                    }),
                )
                .await;
            }
        }
    }
}
