use std::{collections::HashMap, sync::Arc};

use tracing::{debug, warn};

use crate::{
    audio::{PlaybackController, PlaybackState, traits::MediaBackend},
    http::{MusicCatalog, Track},
    state::Observable,
    ui::components::avatar::Thumbnail,
    util::task::TaskManager,
};

/// Size of an album cover thumbnail in terminal cells.
pub const COVER_SIZE: (u16, u16) = (16, 8);

/// Tracks for the configured search term plus the one controller that plays
/// their previews. Dropping the view-model releases the player.
pub struct MusicViewModel {
    catalog: Arc<dyn MusicCatalog>,
    search_term: String,
    tracks: Observable<Vec<Track>>,
    is_loading: Observable<bool>,
    error: Observable<Option<String>>,
    covers: Observable<HashMap<String, Thumbnail>>,
    /// Last cover requested, so repeated frames do not refetch it.
    cover_requested: Option<String>,
    player: PlaybackController,
    tasks: TaskManager,
}

impl MusicViewModel {
    pub fn new(
        catalog: Arc<dyn MusicCatalog>,
        search_term: impl Into<String>,
        backend: Arc<dyn MediaBackend>,
    ) -> Self {
        Self {
            catalog,
            search_term: search_term.into(),
            tracks: Observable::default(),
            is_loading: Observable::default(),
            error: Observable::default(),
            covers: Observable::default(),
            cover_requested: None,
            player: PlaybackController::new(backend),
            tasks: TaskManager::new(),
        }
    }

    pub fn tracks(&self) -> Observable<Vec<Track>> {
        self.tracks.clone()
    }

    pub fn is_loading(&self) -> Observable<bool> {
        self.is_loading.clone()
    }

    pub fn error(&self) -> Observable<Option<String>> {
        self.error.clone()
    }

    /// Decoded covers keyed by their URL.
    pub fn covers(&self) -> Observable<HashMap<String, Thumbnail>> {
        self.covers.clone()
    }

    pub fn playback(&self) -> Observable<PlaybackState> {
        self.player.state()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn fetch_music(&mut self) {
        self.is_loading.set(true);
        self.error.set(None);

        let catalog = self.catalog.clone();
        let term = self.search_term.clone();
        let tracks = self.tracks.clone();
        let is_loading = self.is_loading.clone();
        let error = self.error.clone();
        self.tasks.spawn(
            "fetch_music",
            tokio::spawn(async move {
                match catalog.search(&term).await {
                    Ok(found) => tracks.set(found),
                    Err(e) => {
                        warn!(term = term.as_str(), error = %e, "music_fetch_failed");
                        error.set(Some(e.to_string()));
                    }
                }
                is_loading.set(false);
            }),
        );
    }

    /// Fetches and decodes one cover. A newer request replaces one still in
    /// flight; covers already decoded are not fetched again.
    pub fn load_cover(&mut self, url: &str) {
        if url.is_empty() || self.cover_requested.as_deref() == Some(url) {
            return;
        }
        self.cover_requested = Some(url.to_string());
        if self.covers.with(|covers| covers.contains_key(url)) {
            return;
        }

        let catalog = self.catalog.clone();
        let covers = self.covers.clone();
        let url = url.to_string();
        self.tasks.spawn(
            "cover",
            tokio::spawn(async move {
                let bytes = match catalog.cover(&url).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(url = url.as_str(), error = %e, "music_cover_fetch_failed");
                        return;
                    }
                };
                match Thumbnail::decode(bytes, COVER_SIZE.0, COVER_SIZE.1).await {
                    Some(thumbnail) => covers.update(|covers| {
                        covers.insert(url, thumbnail);
                    }),
                    None => debug!(url = url.as_str(), "music_cover_undecodable"),
                }
            }),
        );
    }

    pub fn init_and_play(&self, url: &str) {
        self.player.play(url);
    }

    pub fn pause(&self) {
        self.player.pause();
    }

    /// Pauses the given track when it is playing, resumes it when paused and
    /// starts it otherwise.
    pub fn toggle(&self, url: &str) {
        match self.player.state().get() {
            PlaybackState::Playing(current) if current == url => self.player.pause(),
            PlaybackState::Paused(current) if current == url => self.player.resume(),
            _ => self.player.play(url),
        }
    }

    #[cfg(test)]
    fn has_active_handle(&self) -> bool {
        self.player.has_active_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{AudioError, traits::PlaybackHandle},
        http::CatalogError,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeCatalog {
        fail: bool,
        searched: std::sync::Mutex<Vec<String>>,
        covers_fetched: AtomicUsize,
    }

    impl FakeCatalog {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                searched: Default::default(),
                covers_fetched: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MusicCatalog for FakeCatalog {
        async fn search(&self, term: &str) -> Result<Vec<Track>, CatalogError> {
            self.searched.lock().unwrap().push(term.to_string());
            if self.fail {
                return Err(CatalogError::Status(429));
            }
            Ok(vec![
                Track {
                    title: "Shape of You".to_string(),
                    preview_url: "https://cdn.example/shape.mp3".to_string(),
                    album_cover_url: "https://cdn.example/divide.jpg".to_string(),
                },
                Track {
                    title: "Perfect".to_string(),
                    preview_url: "https://cdn.example/perfect.mp3".to_string(),
                    album_cover_url: "https://cdn.example/divide.jpg".to_string(),
                },
            ])
        }

        async fn cover(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
            use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

            self.covers_fetched.fetch_add(1, Ordering::SeqCst);
            if !url.ends_with(".jpg") {
                return Err(CatalogError::Status(404));
            }
            let mut png = std::io::Cursor::new(Vec::new());
            DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([200, 30, 30])))
                .write_to(&mut png, ImageFormat::Png)
                .unwrap();
            Ok(png.into_inner())
        }
    }

    struct CountingHandle(Arc<AtomicUsize>);

    impl PlaybackHandle for CountingHandle {
        fn start(&self) {}
        fn pause(&self) {}
        fn stop(&self) {}
    }

    impl Drop for CountingHandle {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct CountingBackend {
        live: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MediaBackend for CountingBackend {
        async fn prepare(&self, _url: &str) -> Result<Box<dyn PlaybackHandle>, AudioError> {
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingHandle(self.live.clone())))
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn fetch_publishes_tracks_for_the_search_term() {
        let catalog = FakeCatalog::new(false);
        let mut vm = MusicViewModel::new(catalog.clone(), "ed sheeran", Arc::new(CountingBackend::default()));

        vm.fetch_music();
        assert!(vm.is_loading().get());
        vm.is_loading().subscribe().wait_for(|loading| !loading).await.unwrap();

        assert_eq!(vm.tracks().with(|t| t.len()), 2);
        assert_eq!(vm.error().get(), None);
        assert_eq!(*catalog.searched.lock().unwrap(), vec!["ed sheeran".to_string()]);
    }

    #[tokio::test]
    async fn fetch_failure_is_published_as_error() {
        let mut vm = MusicViewModel::new(FakeCatalog::new(true), "ed sheeran", Arc::new(CountingBackend::default()));

        vm.fetch_music();
        vm.is_loading().subscribe().wait_for(|loading| !loading).await.unwrap();

        assert!(vm.tracks().with(|t| t.is_empty()));
        assert!(vm.error().get().is_some());
    }

    #[tokio::test]
    async fn toggle_pauses_and_resumes_the_same_track() {
        let vm = MusicViewModel::new(FakeCatalog::new(false), "ed sheeran", Arc::new(CountingBackend::default()));
        let url = "https://cdn.example/shape.mp3";

        vm.toggle(url);
        settle().await;
        assert_eq!(vm.playback().get(), PlaybackState::Playing(url.to_string()));

        vm.toggle(url);
        assert_eq!(vm.playback().get(), PlaybackState::Paused(url.to_string()));

        vm.toggle(url);
        assert_eq!(vm.playback().get(), PlaybackState::Playing(url.to_string()));
    }

    #[tokio::test]
    async fn dropping_the_view_model_releases_playback() {
        let backend = Arc::new(CountingBackend::default());
        let live = backend.live.clone();
        let vm = MusicViewModel::new(FakeCatalog::new(false), "ed sheeran", backend);

        vm.init_and_play("https://cdn.example/shape.mp3");
        settle().await;
        vm.init_and_play("https://cdn.example/perfect.mp3");
        settle().await;
        assert!(vm.has_active_handle());
        assert_eq!(live.load(Ordering::SeqCst), 1);

        drop(vm);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn covers_are_fetched_once_and_decoded() {
        let catalog = FakeCatalog::new(false);
        let mut vm = MusicViewModel::new(catalog.clone(), "ed sheeran", Arc::new(CountingBackend::default()));
        let url = "https://cdn.example/divide.jpg";

        vm.load_cover(url);
        vm.load_cover(url);
        vm.covers()
            .subscribe()
            .wait_for(|covers| covers.contains_key(url))
            .await
            .unwrap();

        assert_eq!(vm.covers().with(|c| c[url].size()), COVER_SIZE);
        assert_eq!(catalog.covers_fetched.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_cover_leaves_no_thumbnail() {
        let catalog = FakeCatalog::new(false);
        let mut vm = MusicViewModel::new(catalog.clone(), "ed sheeran", Arc::new(CountingBackend::default()));

        vm.load_cover("https://cdn.example/missing.png");
        vm.load_cover("");
        settle().await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(vm.covers().with(|c| c.is_empty()));
        assert_eq!(catalog.covers_fetched.load(Ordering::SeqCst), 1);
    }
}
