use std::{io::Cursor, thread};

use async_trait::async_trait;
use flume::Sender;
use rodio::{Decoder, Sink, mixer::Mixer};
use tracing::{debug, info};

use crate::audio::{
    error::AudioError,
    traits::{MediaBackend, PlaybackHandle},
    util::{open_output_stream, setup_device_config},
};

/// Output device plus the HTTP client used to pull preview clips.
///
/// The output stream is owned by a dedicated thread that lives as long as the
/// backend. Each prepared track gets its own [`Sink`] on the shared mixer so
/// releasing a handle never touches the device.
pub struct RodioBackend {
    mixer: Mixer,
    http: reqwest::Client,
    _shutdown: Sender<()>,
}

impl RodioBackend {
    pub fn new() -> Result<Self, AudioError> {
        let (ready_tx, ready_rx) = flume::bounded(1);
        let (shutdown_tx, shutdown_rx) = flume::bounded::<()>(0);

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let opened = setup_device_config().and_then(|(device, config, format)| {
                    open_output_stream(device, &config, format)
                });
                match opened {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(stream.mixer().clone()));
                        // Returns once the backend drops its sender.
                        let _ = shutdown_rx.recv();
                        drop(stream);
                        debug!("audio_output_closed");
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| AudioError::DeviceError(e.to_string()))?;

        let mixer = ready_rx
            .recv()
            .map_err(|e| AudioError::DeviceError(e.to_string()))??;
        info!("audio_output_opened");

        Ok(Self {
            mixer,
            http: reqwest::Client::new(),
            _shutdown: shutdown_tx,
        })
    }
}

#[async_trait]
impl MediaBackend for RodioBackend {
    async fn prepare(&self, url: &str) -> Result<Box<dyn PlaybackHandle>, AudioError> {
        let start = std::time::Instant::now();
        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AudioError::NetworkError(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| AudioError::NetworkError(e.to_string()))?;

        debug!(url, size = bytes.len(), "playback_clip_downloaded");

        let mixer = self.mixer.clone();
        let sink = tokio::task::spawn_blocking(move || -> Result<Sink, AudioError> {
            let source = Decoder::new(Cursor::new(bytes.to_vec()))
                .map_err(|e| AudioError::DecodingError(e.to_string()))?;
            let sink = Sink::connect_new(&mixer);
            sink.pause();
            sink.append(source);
            Ok(sink)
        })
        .await
        .map_err(|e| AudioError::Unknown(e.to_string()))??;

        info!(
            url,
            elapsed_ms = start.elapsed().as_millis(),
            "playback_handle_prepared"
        );

        Ok(Box::new(RodioHandle { sink }))
    }
}

struct RodioHandle {
    sink: Sink,
}

impl PlaybackHandle for RodioHandle {
    fn start(&self) {
        self.sink.play();
    }

    fn pause(&self) {
        self.sink.pause();
    }

    fn stop(&self) {
        self.sink.stop();
    }
}

impl Drop for RodioHandle {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

/// Used when no output device could be opened. Every preparation fails, which
/// the controller surfaces as an error state.
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MediaBackend for UnavailableBackend {
    async fn prepare(&self, _url: &str) -> Result<Box<dyn PlaybackHandle>, AudioError> {
        Err(AudioError::DeviceError(self.reason.clone()))
    }
}
