use std::fmt;

/// Screens the shell can show. `SignIn` is the start destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    #[default]
    SignIn,
    Profile,
    MusicDisplay,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::SignIn => "sign_in",
            Route::Profile => "profile",
            Route::MusicDisplay => "music_display",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
