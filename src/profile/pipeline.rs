use std::{path::Path, sync::Arc};

use tracing::{info, warn};

use crate::profile::{error::ImageError, store::ObjectStore};

const CONTENT_TYPE: &str = "image/jpeg";

pub fn profile_image_key(owner_id: &str) -> String {
    format!("profileImages/{owner_id}.jpg")
}

/// A stored picture ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileImage {
    pub url: String,
    pub bytes: Vec<u8>,
}

/// Upload and re-resolve of profile pictures. Nothing is cached; every
/// visit of the profile screen goes back to the store.
#[derive(Clone)]
pub struct ProfileImagePipeline {
    store: Arc<dyn ObjectStore>,
}

impl ProfileImagePipeline {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Stores `image` for `owner_id`, replacing any previous picture, and
    /// returns its durable URL.
    pub async fn upload(&self, image: Vec<u8>, owner_id: &str) -> Result<String, ImageError> {
        let key = profile_image_key(owner_id);
        self.store
            .put(&key, image, CONTENT_TYPE)
            .await
            .map_err(|e| ImageError::UploadFailed(e.to_string()))?;
        let url = self
            .store
            .download_url(&key)
            .await
            .map_err(|e| ImageError::UploadFailed(e.to_string()))?;
        info!(key = key.as_str(), "profile_image_uploaded");
        Ok(url)
    }

    pub async fn upload_file(&self, path: &Path, owner_id: &str) -> Result<String, ImageError> {
        let image = tokio::fs::read(path)
            .await
            .map_err(|e| ImageError::UploadFailed(format!("{}: {e}", path.display())))?;
        self.upload(image, owner_id).await
    }

    /// `None` on any failure; callers simply show no picture.
    pub async fn resolve(&self, url_or_key: &str) -> Option<ProfileImage> {
        let bytes = match self.store.fetch(url_or_key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(reference = url_or_key, error = %e, "profile_image_resolve_failed");
                return None;
            }
        };

        let url = if url_or_key.contains("://") {
            url_or_key.to_string()
        } else {
            match self.store.download_url(url_or_key).await {
                Ok(url) => url,
                Err(e) => {
                    warn!(reference = url_or_key, error = %e, "profile_image_resolve_failed");
                    return None;
                }
            }
        };

        Some(ProfileImage { url, bytes })
    }
}
