pub mod music;
pub mod profile;
pub mod sign_in;

pub use music::MusicViewModel;
pub use profile::ProfileViewModel;
pub use sign_in::SignInViewModel;
