use std::sync::Arc;

use flume::Sender;
use tracing::{info, warn};

use crate::{
    audio::{
        playback::{RodioBackend, UnavailableBackend},
        traits::MediaBackend,
    },
    auth::{
        AuthSession,
        google::GoogleIdentityProvider,
        loopback::{LoopbackLauncher, SignInLauncher},
        store::{KeyringSessionStore, MemorySessionStore, SessionStore},
    },
    config::AppConfig,
    event::events::Event,
    http::{CatalogClient, MusicCatalog},
    location::{Geocoder, IpLocationProvider, LocationPreferences, LocationProvider, NominatimGeocoder},
    profile::{FirebaseStore, FsObjectStore, ObjectStore, ProfileImagePipeline},
    ui::{
        models::{MusicViewModel, ProfileViewModel, SignInViewModel},
        state::Route,
        traits::View,
        views::{MusicDisplay, Profile, SignIn},
    },
};

/// Services shared by every screen.
pub struct AppContext {
    pub session: Arc<AuthSession>,
    pub launcher: Arc<dyn SignInLauncher>,
    pub catalog: Arc<dyn MusicCatalog>,
    pub search_term: String,
    pub media: Arc<dyn MediaBackend>,
    pub location_provider: Arc<dyn LocationProvider>,
    pub geocoder: Arc<dyn Geocoder>,
    pub preferences: LocationPreferences,
    pub images: ProfileImagePipeline,
    pub event_tx: Sender<Event>,
}

impl AppContext {
    pub fn new(config: &AppConfig, event_tx: Sender<Event>) -> Self {
        let store: Arc<dyn SessionStore> = match KeyringSessionStore::new() {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(error = %e, "keyring_unavailable");
                Arc::new(MemorySessionStore::default())
            }
        };
        let session = Arc::new(AuthSession::new(
            Arc::new(GoogleIdentityProvider::new(&config.google)),
            store,
        ));

        let media: Arc<dyn MediaBackend> = match RodioBackend::new() {
            Ok(backend) => Arc::new(backend),
            Err(e) => {
                warn!(error = %e, "audio_output_unavailable");
                Arc::new(UnavailableBackend::new(e.to_string()))
            }
        };

        let objects: Arc<dyn ObjectStore> = match &config.storage.firebase_bucket {
            Some(bucket) => {
                info!(bucket = bucket.as_str(), "profile_images_on_firebase");
                Arc::new(FirebaseStore::new(bucket))
            }
            None => {
                info!(root = %config.storage.local_root.display(), "profile_images_on_disk");
                Arc::new(FsObjectStore::new(config.storage.local_root.clone()))
            }
        };

        Self {
            session,
            launcher: Arc::new(LoopbackLauncher),
            catalog: Arc::new(CatalogClient::new(&config.catalog)),
            search_term: config.catalog.search_term.clone(),
            media,
            location_provider: Arc::new(IpLocationProvider::new(&config.location)),
            geocoder: Arc::new(NominatimGeocoder::new(&config.location.geocoder_url)),
            preferences: LocationPreferences::new(config.location.preferences_path.clone()),
            images: ProfileImagePipeline::new(objects),
            event_tx,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.current_user().is_some()
    }

    /// Builds a fresh screen for `route`; every visit gets its own view-model.
    pub fn build_view(&self, route: Route) -> Box<dyn View> {
        match route {
            Route::SignIn => Box::new(SignIn::new(SignInViewModel::new(
                self.session.clone(),
                self.launcher.clone(),
            ))),
            Route::MusicDisplay => Box::new(MusicDisplay::new(MusicViewModel::new(
                self.catalog.clone(),
                self.search_term.clone(),
                self.media.clone(),
            ))),
            Route::Profile => Box::new(Profile::new(ProfileViewModel::new(
                self.session.clone(),
                self.images.clone(),
                self.location_provider.clone(),
                self.geocoder.clone(),
                self.preferences.clone(),
                self.event_tx.clone(),
            ))),
        }
    }
}
