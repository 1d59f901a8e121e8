use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ui::{state::Route, traits::Action};

pub struct InputHandler;

impl InputHandler {
    /// Shortcuts available on every screen once the active view has passed on
    /// a key.
    pub fn handle_key(key: KeyEvent, route: Route, signed_in: bool) -> Option<Action> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),
            (KeyCode::Char('q'), _) => Some(Action::Quit),
            (KeyCode::Char('p'), _) if signed_in && route != Route::Profile => {
                Some(Action::Navigate(Route::Profile))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn profile_shortcut_requires_sign_in() {
        assert_eq!(
            InputHandler::handle_key(key(KeyCode::Char('p')), Route::MusicDisplay, true),
            Some(Action::Navigate(Route::Profile))
        );
        assert_eq!(InputHandler::handle_key(key(KeyCode::Char('p')), Route::SignIn, false), None);
        assert_eq!(InputHandler::handle_key(key(KeyCode::Char('p')), Route::Profile, true), None);
    }

    #[test]
    fn quit_keys() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(InputHandler::handle_key(ctrl_c, Route::Profile, true), Some(Action::Quit));
        assert_eq!(
            InputHandler::handle_key(key(KeyCode::Char('q')), Route::SignIn, false),
            Some(Action::Quit)
        );
        assert_eq!(InputHandler::handle_key(key(KeyCode::Char('c')), Route::Profile, true), None);
    }
}
