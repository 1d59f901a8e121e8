use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::location::{error::LocationError, types::LatLong};

/// Stored at `f32` precision under `latitude` and `longitude`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct StoredLocation {
    latitude: f32,
    longitude: f32,
}

/// Last known location, overwritten on every fix.
#[derive(Debug, Clone)]
pub struct LocationPreferences {
    path: PathBuf,
}

impl LocationPreferences {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub async fn save(&self, location: LatLong) -> Result<(), LocationError> {
        let stored = StoredLocation {
            latitude: location.latitude as f32,
            longitude: location.longitude as f32,
        };
        let json =
            serde_json::to_vec_pretty(&stored).map_err(|e| LocationError::Preferences(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LocationError::Preferences(e.to_string()))?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| LocationError::Preferences(e.to_string()))
    }

    pub async fn load(&self) -> Result<Option<LatLong>, LocationError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LocationError::Preferences(e.to_string())),
        };
        let stored: StoredLocation =
            serde_json::from_slice(&bytes).map_err(|e| LocationError::Preferences(e.to_string()))?;
        Ok(Some(LatLong::new(
            stored.latitude as f64,
            stored.longitude as f64,
        )))
    }
}
