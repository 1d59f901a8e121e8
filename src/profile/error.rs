use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Could not resolve image: {0}")]
    ResolveFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
