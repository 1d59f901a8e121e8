/// What the controller is doing, keyed by the preview URL it was asked to play.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Buffering(String),
    Playing(String),
    Paused(String),
    Error(String),
}
