use crate::audio::error::AudioError;
use async_trait::async_trait;

/// A prepared decoder bound to an output. Dropping it frees the decoder.
pub trait PlaybackHandle: Send {
    fn start(&self);
    fn pause(&self);
    fn stop(&self);
}

/// Turns a URL into a ready-to-start [`PlaybackHandle`].
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn prepare(&self, url: &str) -> Result<Box<dyn PlaybackHandle>, AudioError>;
}
