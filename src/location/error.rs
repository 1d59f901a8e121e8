use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location provider error: {0}")]
    Provider(String),

    #[error("Unknown subscription {0}")]
    UnknownSubscription(uuid::Uuid),

    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    #[error("Preferences error: {0}")]
    Preferences(String),
}
