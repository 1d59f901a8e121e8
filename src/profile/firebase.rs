use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

use crate::profile::{error::ImageError, store::ObjectStore};

const FIREBASE_STORAGE_URL: &str = "https://firebasestorage.googleapis.com/v0/b";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Firebase Storage through its REST endpoint.
pub struct FirebaseStore {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl FirebaseStore {
    pub fn new(bucket: &str) -> Self {
        Self::with_base_url(FIREBASE_STORAGE_URL, bucket)
    }

    pub fn with_base_url(base_url: &str, bucket: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        }
    }

    fn objects_url(&self) -> Result<Url, ImageError> {
        Url::parse(&format!("{}/{}/o", self.base_url, self.bucket))
            .map_err(|e| ImageError::Storage(e.to_string()))
    }

    /// `.../o/profileImages%2Fu.jpg`, the key is one encoded path segment.
    fn object_url(&self, key: &str) -> Result<Url, ImageError> {
        let mut url = self.objects_url()?;
        url.path_segments_mut()
            .map_err(|_| ImageError::Storage("storage url cannot be a base".into()))?
            .push(key);
        Ok(url)
    }

    fn owns(&self, url: &str) -> bool {
        url.starts_with(&self.base_url)
    }
}

#[async_trait]
impl ObjectStore for FirebaseStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), ImageError> {
        let mut url = self.objects_url()?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", key);

        let size = bytes.len();
        self.http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ImageError::Storage(e.to_string()))?;

        info!(key, size, "firebase_object_uploaded");
        Ok(())
    }

    async fn download_url(&self, key: &str) -> Result<String, ImageError> {
        let response = self
            .http
            .get(self.object_url(key)?)
            .send()
            .await
            .map_err(|e| ImageError::Storage(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ImageError::NotFound(key.to_string()));
        }
        let metadata: ObjectMetadata = response
            .error_for_status()
            .map_err(|e| ImageError::Storage(e.to_string()))?
            .json()
            .await
            .map_err(|e| ImageError::Storage(e.to_string()))?;

        let mut url = self.object_url(key)?;
        url.query_pairs_mut().append_pair("alt", "media");
        if let Some(token) = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
        {
            url.query_pairs_mut().append_pair("token", token);
        }
        debug!(key, "firebase_download_url_resolved");
        Ok(url.to_string())
    }

    async fn fetch(&self, url_or_key: &str) -> Result<Vec<u8>, ImageError> {
        let url = if url_or_key.contains("://") {
            if !self.owns(url_or_key) {
                return Err(ImageError::ResolveFailed(format!(
                    "{url_or_key} is not in this bucket"
                )));
            }
            url_or_key.to_string()
        } else {
            self.download_url(url_or_key).await?
        };

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ImageError::Storage(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ImageError::NotFound(url_or_key.to_string()));
        }
        let bytes = response
            .error_for_status()
            .map_err(|e| ImageError::Storage(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| ImageError::Storage(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_is_a_single_encoded_segment() {
        let store = FirebaseStore::new("demo.appspot.com");
        let url = store.object_url("profileImages/1234.jpg").unwrap();
        assert_eq!(
            url.as_str(),
            "https://firebasestorage.googleapis.com/v0/b/demo.appspot.com/o/profileImages%2F1234.jpg"
        );
    }

    #[tokio::test]
    async fn foreign_urls_are_not_fetched() {
        let store = FirebaseStore::new("demo.appspot.com");
        assert!(matches!(
            store.fetch("https://lh3.googleusercontent.com/a/photo.jpg").await,
            Err(ImageError::ResolveFailed(_))
        ));
    }
}
