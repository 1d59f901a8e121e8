pub mod controller;
pub mod error;
pub mod playback;
pub mod state;
pub mod traits;
mod util;

pub use controller::PlaybackController;
pub use error::AudioError;
pub use state::PlaybackState;
