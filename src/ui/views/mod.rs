pub mod music_display;
pub mod profile;
pub mod sign_in;

pub use music_display::MusicDisplay;
pub use profile::Profile;
pub use sign_in::SignIn;
