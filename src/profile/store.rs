use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::profile::error::ImageError;

/// Bucket-style storage: objects are written under a key and read back
/// either by key or by the URL the store handed out for it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), ImageError>;
    async fn download_url(&self, key: &str) -> Result<String, ImageError>;
    async fn fetch(&self, url_or_key: &str) -> Result<Vec<u8>, ImageError>;
}

/// A bucket rooted in a local directory. URLs are `file://` URLs.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()
                .map(|dir| dir.join(&root))
                .unwrap_or(root)
        };
        Self { root }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ImageError> {
        let relative = Path::new(key);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(ImageError::Storage(format!("invalid key {key}")));
        }
        Ok(self.root.join(relative))
    }

    fn resolve_path(&self, url_or_key: &str) -> Result<PathBuf, ImageError> {
        if url_or_key.contains("://") {
            let url = Url::parse(url_or_key).map_err(|e| ImageError::ResolveFailed(e.to_string()))?;
            if url.scheme() != "file" {
                return Err(ImageError::ResolveFailed(format!(
                    "{url_or_key} is not in this bucket"
                )));
            }
            let path = url
                .to_file_path()
                .map_err(|_| ImageError::ResolveFailed(url_or_key.to_string()))?;
            if !path.starts_with(&self.root) {
                return Err(ImageError::ResolveFailed(format!(
                    "{url_or_key} is not in this bucket"
                )));
            }
            Ok(path)
        } else {
            self.path_for(url_or_key)
        }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), ImageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ImageError::Storage(e.to_string()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ImageError::Storage(e.to_string()))?;
        debug!(key, "fs_object_written");
        Ok(())
    }

    async fn download_url(&self, key: &str) -> Result<String, ImageError> {
        let path = self.path_for(key)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ImageError::NotFound(key.to_string()));
        }
        Url::from_file_path(&path)
            .map(|url| url.to_string())
            .map_err(|_| ImageError::Storage(format!("{} is not a valid path", path.display())))
    }

    async fn fetch(&self, url_or_key: &str) -> Result<Vec<u8>, ImageError> {
        let path = self.resolve_path(url_or_key)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImageError::NotFound(url_or_key.to_string()),
            _ => ImageError::Storage(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> FsObjectStore {
        FsObjectStore::new(std::env::temp_dir().join(format!("symphony-bucket-{}", uuid::Uuid::new_v4())))
    }

    #[tokio::test]
    async fn put_overwrites_and_fetches_by_url_or_key() {
        let store = bucket();
        store.put("profileImages/u.jpg", b"one".to_vec(), "image/jpeg").await.unwrap();
        store.put("profileImages/u.jpg", b"two".to_vec(), "image/jpeg").await.unwrap();

        let url = store.download_url("profileImages/u.jpg").await.unwrap();
        assert!(url.starts_with("file://"));
        assert_eq!(store.fetch(&url).await.unwrap(), b"two");
        assert_eq!(store.fetch("profileImages/u.jpg").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn rejects_keys_escaping_the_root() {
        let store = bucket();
        assert!(store.put("../evil.jpg", vec![1], "image/jpeg").await.is_err());
        assert!(store.fetch("file:///etc/passwd").await.is_err());
        assert!(store.fetch("https://example.com/a.jpg").await.is_err());
    }

    #[tokio::test]
    async fn missing_objects_are_not_found() {
        let store = bucket();
        assert_eq!(
            store.download_url("profileImages/nobody.jpg").await,
            Err(ImageError::NotFound("profileImages/nobody.jpg".to_string()))
        );
        assert!(matches!(
            store.fetch("profileImages/nobody.jpg").await,
            Err(ImageError::NotFound(_))
        ));
    }
}
