use std::{path::PathBuf, sync::Arc};

use flume::Sender;
use tracing::{debug, info, warn};

use crate::{
    auth::{AuthSession, UserData},
    event::events::Event,
    location::{
        Geocoder, LatLong, LocationPreferences, LocationProvider, LocationTracker,
        readable_location,
    },
    profile::{ProfileImage, ProfileImagePipeline},
    state::Observable,
    ui::components::avatar::Thumbnail,
    util::task::TaskManager,
};

/// Size of the avatar thumbnail in terminal cells.
pub const AVATAR_SIZE: (u16, u16) = (18, 8);

const UPLOAD_SUCCEEDED: &str = "Upload successful";
const UPLOAD_FAILED: &str = "Upload failed";
const SIGNED_OUT: &str = "Signed Out";

/// State behind the profile screen. Location updates run only while the
/// view-model is alive; dropping it stops them.
pub struct ProfileViewModel {
    session: Arc<AuthSession>,
    images: ProfileImagePipeline,
    geocoder: Arc<dyn Geocoder>,
    preferences: LocationPreferences,
    tracker: Arc<LocationTracker>,
    user: Observable<Option<UserData>>,
    image: Observable<Option<ProfileImage>>,
    avatar: Observable<Option<Thumbnail>>,
    readable_location: Observable<String>,
    uploading: Observable<bool>,
    events: Sender<Event>,
    tasks: TaskManager,
}

impl ProfileViewModel {
    pub fn new(
        session: Arc<AuthSession>,
        images: ProfileImagePipeline,
        location_provider: Arc<dyn LocationProvider>,
        geocoder: Arc<dyn Geocoder>,
        preferences: LocationPreferences,
        events: Sender<Event>,
    ) -> Self {
        let user = Observable::new(session.current_user());
        Self {
            session,
            images,
            geocoder,
            preferences,
            tracker: Arc::new(LocationTracker::new(location_provider)),
            user,
            image: Observable::default(),
            avatar: Observable::default(),
            readable_location: Observable::default(),
            uploading: Observable::default(),
            events,
            tasks: TaskManager::new(),
        }
    }

    /// Local copy of the signed-in user, updated ahead of the session while
    /// an edit is in flight.
    pub fn user(&self) -> Observable<Option<UserData>> {
        self.user.clone()
    }

    #[cfg(test)]
    pub fn image(&self) -> Observable<Option<ProfileImage>> {
        self.image.clone()
    }

    /// The picture decoded for display, `None` until one resolves.
    pub fn avatar(&self) -> Observable<Option<Thumbnail>> {
        self.avatar.clone()
    }

    pub fn readable_location(&self) -> Observable<String> {
        self.readable_location.clone()
    }

    pub fn location(&self) -> Observable<Option<LatLong>> {
        self.tracker.location()
    }

    pub fn uploading(&self) -> Observable<bool> {
        self.uploading.clone()
    }

    pub fn on_mount(&mut self) {
        self.load_image();
        self.start_location();
    }

    fn load_image(&mut self) {
        let Some(url) = self.user.with(|u| u.as_ref().and_then(|u| u.profile_picture_url.clone())) else {
            return;
        };
        let images = self.images.clone();
        let image = self.image.clone();
        let avatar = self.avatar.clone();
        self.tasks.spawn(
            "resolve_image",
            tokio::spawn(async move {
                show_picture(&images, &url, &image, &avatar).await;
            }),
        );
    }

    /// Fixes are handled one at a time in arrival order, so the newest fix
    /// is always the one left on disk and on screen.
    fn start_location(&mut self) {
        let tracker = self.tracker.clone();
        let preferences = self.preferences.clone();
        let geocoder = self.geocoder.clone();
        let readable = self.readable_location.clone();
        let (fix_tx, fix_rx) = flume::unbounded::<LatLong>();

        self.tasks.spawn(
            "location_fixes",
            tokio::spawn(async move {
                while let Ok(fix) = fix_rx.recv_async().await {
                    if let Err(e) = preferences.save(fix).await {
                        warn!(error = %e, "location_preferences_save_failed");
                    }
                    readable.set(readable_location(geocoder.as_ref(), fix).await);
                }
            }),
        );
        self.tasks.spawn(
            "location",
            tokio::spawn(async move {
                tracker
                    .start(move |fix| {
                        let _ = fix_tx.send(fix);
                    })
                    .await;
            }),
        );
    }

    /// Uploads the picked file as the user's picture, then points both the
    /// local copy and the session at the new URL.
    pub fn change_picture(&mut self, path: PathBuf) {
        let Some(user_id) = self.user.with(|u| u.as_ref().map(|u| u.user_id.clone())) else {
            debug!("profile_change_picture_signed_out");
            return;
        };

        self.uploading.set(true);
        let session = self.session.clone();
        let images = self.images.clone();
        let user = self.user.clone();
        let image = self.image.clone();
        let avatar = self.avatar.clone();
        let uploading = self.uploading.clone();
        let events = self.events.clone();

        self.tasks.spawn(
            "upload",
            tokio::spawn(async move {
                match images.upload_file(&path, &user_id).await {
                    Ok(url) => {
                        session.update_profile_picture(&url);
                        user.update(|u| {
                            if let Some(u) = u {
                                u.profile_picture_url = Some(url.clone());
                            }
                        });
                        show_picture(&images, &url, &image, &avatar).await;
                        info!(user_id = user_id.as_str(), "profile_picture_updated");
                        let _ = events.send(Event::Toast(UPLOAD_SUCCEEDED.to_string()));
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "profile_picture_upload_failed");
                        let _ = events.send(Event::Toast(UPLOAD_FAILED.to_string()));
                    }
                }
                uploading.set(false);
            }),
        );
    }

    pub fn sign_out(&mut self) {
        let session = self.session.clone();
        let tracker = self.tracker.clone();
        let events = self.events.clone();
        self.tasks.spawn(
            "sign_out",
            tokio::spawn(async move {
                tracker.stop().await;
                session.sign_out().await;
                let _ = events.send(Event::Toast(SIGNED_OUT.to_string()));
                let _ = events.send(Event::SignedOut);
            }),
        );
    }
}

async fn show_picture(
    images: &ProfileImagePipeline,
    url: &str,
    image: &Observable<Option<ProfileImage>>,
    avatar: &Observable<Option<Thumbnail>>,
) {
    let resolved = images.resolve(url).await;
    let thumbnail = match &resolved {
        Some(picture) => Thumbnail::decode(picture.bytes.clone(), AVATAR_SIZE.0, AVATAR_SIZE.1).await,
        None => None,
    };
    image.set(resolved);
    avatar.set(thumbnail);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{session::tests::FakeProvider, store::MemorySessionStore, ExternalResult},
        location::{Address, LocationError, tracker::tests::FakeProvider as FakeLocation},
        profile::FsObjectStore,
    };
    use async_trait::async_trait;
    use std::{path::Path, sync::atomic::Ordering, time::Duration};

    struct FakeGeocoder;

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn reverse(&self, _at: LatLong) -> Result<Option<Address>, LocationError> {
            Ok(Some(Address {
                line: "1 Infinite Loop".to_string(),
                locality: Some("Cupertino".to_string()),
            }))
        }
    }

    struct Fixture {
        dir: PathBuf,
        session: Arc<AuthSession>,
        location: Arc<FakeLocation>,
        events: flume::Receiver<Event>,
        vm: ProfileViewModel,
    }

    async fn fixture(location: FakeLocation, signed_in: bool) -> Fixture {
        fixture_with(location, signed_in, Arc::new(FakeGeocoder)).await
    }

    async fn fixture_with(
        location: FakeLocation,
        signed_in: bool,
        geocoder: Arc<dyn Geocoder>,
    ) -> Fixture {
        let dir = std::env::temp_dir().join(format!("symphony-profile-{}", uuid::Uuid::new_v4()));
        let session = Arc::new(AuthSession::new(
            Arc::new(FakeProvider::default()),
            Arc::new(MemorySessionStore::default()),
        ));
        if signed_in {
            session.sign_in().await.unwrap();
            let result = session
                .complete_sign_in(ExternalResult::Authorized {
                    code: "code".to_string(),
                    state: "state-1".to_string(),
                })
                .await;
            assert!(result.data.is_some());
        }

        let location = Arc::new(location);
        let (tx, rx) = flume::unbounded();
        let vm = ProfileViewModel::new(
            session.clone(),
            ProfileImagePipeline::new(Arc::new(FsObjectStore::new(dir.join("bucket")))),
            location.clone(),
            geocoder,
            LocationPreferences::new(dir.join("user_location.json")),
            tx,
        );
        Fixture {
            dir,
            session,
            location,
            events: rx,
            vm,
        }
    }

    async fn write_picture(dir: &Path, bytes: &[u8]) -> PathBuf {
        tokio::fs::create_dir_all(dir).await.unwrap();
        let path = dir.join("picked.jpg");
        tokio::fs::write(&path, bytes).await.unwrap();
        path
    }

    async fn next_event(rx: &flume::Receiver<Event>) -> Event {
        tokio::time::timeout(Duration::from_secs(5), rx.recv_async())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn denied_permission_leaves_location_at_origin() {
        let denied = FakeLocation {
            denied: true,
            ..FakeLocation::default()
        };
        let mut f = fixture(denied, true).await;
        f.vm.on_mount();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(f.vm.location().get(), None);
        assert_eq!(f.vm.tracker.current(), LatLong::default());
        assert_eq!(f.vm.readable_location().get(), "");
        assert_eq!(f.location.live(), 0);
    }

    #[tokio::test]
    async fn fixes_are_saved_and_geocoded() {
        let mut f = fixture(FakeLocation::default(), true).await;
        f.vm.on_mount();
        tokio::time::timeout(Duration::from_secs(5), async {
            while f.location.live() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        f.location.push(LatLong::new(37.33, -122.03));
        f.vm.readable_location()
            .subscribe()
            .wait_for(|s| !s.is_empty())
            .await
            .unwrap();

        assert_eq!(f.vm.readable_location().get(), "1 Infinite Loop, Cupertino");
        assert_eq!(f.vm.location().get(), Some(LatLong::new(37.33, -122.03)));
        let saved = LocationPreferences::new(f.dir.join("user_location.json"))
            .load()
            .await
            .unwrap()
            .unwrap();
        assert!((saved.latitude - 37.33).abs() < 1e-4);
    }

    /// The first fix takes much longer to geocode than the second.
    struct SlowThenFastGeocoder;

    #[async_trait]
    impl Geocoder for SlowThenFastGeocoder {
        async fn reverse(&self, at: LatLong) -> Result<Option<Address>, LocationError> {
            if at.latitude < 2.0 {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Ok(Some(Address {
                line: format!("Fix {}", at.latitude),
                locality: None,
            }))
        }
    }

    async fn wait_for_subscription(location: &FakeLocation) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while location.live() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn latest_fix_wins_over_slower_earlier_one() {
        let mut f = fixture_with(FakeLocation::default(), true, Arc::new(SlowThenFastGeocoder)).await;
        f.vm.on_mount();
        wait_for_subscription(&f.location).await;

        f.location.push(LatLong::new(1.0, 1.0));
        f.location.push(LatLong::new(2.0, 2.0));
        f.vm.readable_location()
            .subscribe()
            .wait_for(|s| s == "Fix 2")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(f.vm.readable_location().get(), "Fix 2");
        let saved = LocationPreferences::new(f.dir.join("user_location.json"))
            .load()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved, LatLong::new(2.0, 2.0));
    }

    #[tokio::test]
    async fn dropping_the_view_model_stops_updates() {
        let mut f = fixture(FakeLocation::default(), true).await;
        f.vm.on_mount();
        tokio::time::timeout(Duration::from_secs(5), async {
            while f.location.live() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        drop(f.vm);
        tokio::time::timeout(Duration::from_secs(5), async {
            while f.location.live() != 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(f.location.removed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upload_updates_session_and_toasts() {
        let mut f = fixture(FakeLocation::default(), true).await;
        let path = write_picture(&f.dir, b"\xFF\xD8jpeg").await;

        f.vm.change_picture(path);
        assert_eq!(next_event(&f.events).await, Event::Toast(UPLOAD_SUCCEEDED.to_string()));

        let url = f.session.current_user().and_then(|u| u.profile_picture_url).unwrap();
        assert_eq!(
            f.vm.user().get().and_then(|u| u.profile_picture_url),
            Some(url.clone())
        );
        let image = f.vm.image().get().unwrap();
        assert_eq!(image.url, url);
        assert_eq!(image.bytes, b"\xFF\xD8jpeg");
        assert_eq!(f.vm.avatar().get(), None);
        assert!(!f.vm.uploading().get());
    }

    #[tokio::test]
    async fn uploaded_picture_is_decoded_into_avatar() {
        use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

        let mut f = fixture(FakeLocation::default(), true).await;
        let mut png = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([0, 128, 0])))
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();
        let path = write_picture(&f.dir, png.get_ref()).await;

        f.vm.change_picture(path);
        assert_eq!(next_event(&f.events).await, Event::Toast(UPLOAD_SUCCEEDED.to_string()));

        let avatar = f.vm.avatar().get().unwrap();
        assert_eq!(avatar.size(), AVATAR_SIZE);
    }

    #[tokio::test]
    async fn missing_file_toasts_failure() {
        let mut f = fixture(FakeLocation::default(), true).await;

        f.vm.change_picture(f.dir.join("does-not-exist.png"));
        assert_eq!(next_event(&f.events).await, Event::Toast(UPLOAD_FAILED.to_string()));
        assert!(f.session.current_user().unwrap().profile_picture_url.is_none());
    }

    #[tokio::test]
    async fn stored_picture_is_resolved_on_mount() {
        let mut first = fixture(FakeLocation::default(), true).await;
        let path = write_picture(&first.dir, b"avatar").await;
        first.vm.change_picture(path);
        next_event(&first.events).await;

        let (tx, _rx) = flume::unbounded();
        let mut vm = ProfileViewModel::new(
            first.session.clone(),
            ProfileImagePipeline::new(Arc::new(FsObjectStore::new(first.dir.join("bucket")))),
            first.location.clone(),
            Arc::new(FakeGeocoder),
            LocationPreferences::new(first.dir.join("user_location.json")),
            tx,
        );
        vm.on_mount();
        vm.image().subscribe().wait_for(|i| i.is_some()).await.unwrap();
        assert_eq!(vm.image().get().unwrap().bytes, b"avatar");
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_notifies() {
        let mut f = fixture(FakeLocation::default(), true).await;

        f.vm.sign_out();
        assert_eq!(next_event(&f.events).await, Event::Toast(SIGNED_OUT.to_string()));
        assert_eq!(next_event(&f.events).await, Event::SignedOut);
        assert!(f.session.current_user().is_none());
    }
}
