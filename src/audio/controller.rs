use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    audio::{
        state::PlaybackState,
        traits::{MediaBackend, PlaybackHandle},
    },
    state::Observable,
};

#[derive(Default)]
struct Slot {
    generation: u64,
    handle: Option<Box<dyn PlaybackHandle>>,
    preparing: Option<JoinHandle<()>>,
}

impl Slot {
    /// Stops and frees the live handle and cancels any pending preparation.
    fn release(&mut self) {
        if let Some(task) = self.preparing.take() {
            task.abort();
        }
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

/// Owns the single playback handle of a screen.
///
/// `play` frees the previous handle before the new one starts preparing, and a
/// preparation that finishes after a newer `play` is dropped instead of
/// installed, so at most one handle is ever held.
pub struct PlaybackController {
    backend: Arc<dyn MediaBackend>,
    slot: Arc<Mutex<Slot>>,
    state: Observable<PlaybackState>,
    released: AtomicBool,
}

impl PlaybackController {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            slot: Arc::new(Mutex::new(Slot::default())),
            state: Observable::default(),
            released: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> Observable<PlaybackState> {
        self.state.clone()
    }

    pub fn has_active_handle(&self) -> bool {
        lock(&self.slot).handle.is_some()
    }

    pub fn play(&self, url: &str) {
        if self.released.load(Ordering::Acquire) {
            warn!(url, "playback_play_after_release");
            return;
        }

        let generation = {
            let mut slot = lock(&self.slot);
            slot.release();
            slot.generation += 1;
            slot.generation
        };

        self.state.set(PlaybackState::Buffering(url.to_string()));

        let backend = self.backend.clone();
        let slot = self.slot.clone();
        let state = self.state.clone();
        let url = url.to_string();

        let task = tokio::spawn(async move {
            let result = backend.prepare(&url).await;

            let mut guard = lock(&slot);
            if guard.generation != generation {
                debug!(url = url.as_str(), "playback_stale_preparation_dropped");
                return;
            }
            guard.preparing = None;

            match result {
                Ok(handle) => {
                    handle.start();
                    guard.handle = Some(handle);
                    drop(guard);
                    info!(url = url.as_str(), "playback_started");
                    state.set(PlaybackState::Playing(url));
                }
                Err(e) => {
                    drop(guard);
                    warn!(url = url.as_str(), error = %e, "playback_prepare_failed");
                    state.set(PlaybackState::Error(e.to_string()));
                }
            }
        });

        let mut slot = lock(&self.slot);
        if slot.generation == generation && !task.is_finished() {
            slot.preparing = Some(task);
        }
    }

    pub fn pause(&self) {
        let slot = lock(&self.slot);
        if let Some(handle) = &slot.handle {
            handle.pause();
            drop(slot);
            self.state.update(|state| {
                if let PlaybackState::Playing(url) = state {
                    *state = PlaybackState::Paused(std::mem::take(url));
                }
            });
        }
    }

    pub fn resume(&self) {
        let slot = lock(&self.slot);
        if let Some(handle) = &slot.handle {
            handle.start();
            drop(slot);
            self.state.update(|state| {
                if let PlaybackState::Paused(url) = state {
                    *state = PlaybackState::Playing(std::mem::take(url));
                }
            });
        }
    }

    /// Frees everything; the controller ignores further `play` calls.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        {
            let mut slot = lock(&self.slot);
            slot.release();
            slot.generation += 1;
        }
        self.state.set(PlaybackState::Stopped);
        debug!("playback_controller_released");
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::error::AudioError;
    use async_trait::async_trait;
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    #[derive(Default)]
    struct Counters {
        live: AtomicUsize,
        max_live: AtomicUsize,
        started: Mutex<Vec<String>>,
        paused: AtomicUsize,
    }

    struct FakeHandle {
        url: String,
        counters: Arc<Counters>,
    }

    impl PlaybackHandle for FakeHandle {
        fn start(&self) {
            self.counters.started.lock().unwrap().push(self.url.clone());
        }

        fn pause(&self) {
            self.counters.paused.fetch_add(1, Ordering::SeqCst);
        }

        fn stop(&self) {}
    }

    impl Drop for FakeHandle {
        fn drop(&mut self) {
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        counters: Arc<Counters>,
        delays: HashMap<String, Duration>,
        failing: Vec<String>,
    }

    impl FakeBackend {
        fn with_delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }

        fn failing(mut self, url: &str) -> Self {
            self.failing.push(url.to_string());
            self
        }
    }

    #[async_trait]
    impl MediaBackend for FakeBackend {
        async fn prepare(&self, url: &str) -> Result<Box<dyn PlaybackHandle>, AudioError> {
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.iter().any(|u| u == url) {
                return Err(AudioError::DecodingError("bad clip".to_string()));
            }
            let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.counters.max_live.fetch_max(live, Ordering::SeqCst);
            Ok(Box::new(FakeHandle {
                url: url.to_string(),
                counters: self.counters.clone(),
            }))
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn second_play_replaces_first() {
        let backend = FakeBackend::default().with_delay("a", Duration::from_millis(10));
        let counters = backend.counters.clone();
        let controller = PlaybackController::new(Arc::new(backend));

        controller.play("a");
        settle().await;
        controller.play("b");
        settle().await;

        assert!(controller.has_active_handle());
        assert_eq!(counters.live.load(Ordering::SeqCst), 1);
        assert_eq!(counters.max_live.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state().get(), PlaybackState::Playing("b".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_first_preparation_never_wins() {
        let backend = FakeBackend::default()
            .with_delay("slow", Duration::from_millis(500))
            .with_delay("fast", Duration::from_millis(10));
        let counters = backend.counters.clone();
        let controller = PlaybackController::new(Arc::new(backend));

        controller.play("slow");
        controller.play("fast");
        settle().await;

        assert_eq!(counters.live.load(Ordering::SeqCst), 1);
        assert_eq!(*counters.started.lock().unwrap(), vec!["fast".to_string()]);
        assert_eq!(controller.state().get(), PlaybackState::Playing("fast".to_string()));
    }

    #[tokio::test]
    async fn pause_without_handle_is_noop() {
        let backend = FakeBackend::default();
        let counters = backend.counters.clone();
        let controller = PlaybackController::new(Arc::new(backend));

        controller.pause();

        assert!(!controller.has_active_handle());
        assert_eq!(counters.paused.load(Ordering::SeqCst), 0);
        assert_eq!(controller.state().get(), PlaybackState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_keeps_handle() {
        let backend = FakeBackend::default();
        let counters = backend.counters.clone();
        let controller = PlaybackController::new(Arc::new(backend));

        controller.play("a");
        settle().await;
        controller.pause();

        assert!(controller.has_active_handle());
        assert_eq!(counters.paused.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state().get(), PlaybackState::Paused("a".to_string()));

        controller.resume();
        assert_eq!(controller.state().get(), PlaybackState::Playing("a".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_preparation_leaves_no_handle() {
        let backend = FakeBackend::default().failing("broken");
        let counters = backend.counters.clone();
        let controller = PlaybackController::new(Arc::new(backend));

        controller.play("ok");
        settle().await;
        controller.play("broken");
        settle().await;

        assert!(!controller.has_active_handle());
        assert_eq!(counters.live.load(Ordering::SeqCst), 0);
        assert!(matches!(controller.state().get(), PlaybackState::Error(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn release_frees_and_disables() {
        let backend = FakeBackend::default();
        let counters = backend.counters.clone();
        let controller = PlaybackController::new(Arc::new(backend));

        controller.play("a");
        settle().await;
        controller.release();
        controller.play("b");
        settle().await;

        assert!(!controller.has_active_handle());
        assert_eq!(counters.live.load(Ordering::SeqCst), 0);
        assert_eq!(controller.state().get(), PlaybackState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_releases_handle() {
        let backend = FakeBackend::default();
        let counters = backend.counters.clone();

        {
            let controller = PlaybackController::new(Arc::new(backend));
            controller.play("a");
            settle().await;
            assert_eq!(counters.live.load(Ordering::SeqCst), 1);
        }

        assert_eq!(counters.live.load(Ordering::SeqCst), 0);
    }
}
