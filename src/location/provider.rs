use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::LocationConfig,
    location::{
        error::LocationError,
        types::{LatLong, LocationRequest, PermissionStatus},
    },
};

/// An open stream of fixes. Dropping the receiver does not unsubscribe;
/// call [`LocationProvider::remove_updates`] with the id.
pub struct Subscription {
    pub id: Uuid,
    pub fixes: flume::Receiver<LatLong>,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    fn check_permission(&self) -> PermissionStatus;
    async fn request_permission(&self) -> PermissionStatus;
    async fn last_location(&self) -> Result<Option<LatLong>, LocationError>;
    async fn request_updates(&self, request: LocationRequest) -> Result<Subscription, LocationError>;
    async fn remove_updates(&self, id: Uuid) -> Result<(), LocationError>;
}

#[derive(Debug, Deserialize)]
struct IpLocation {
    #[serde(alias = "latitude")]
    lat: f64,
    #[serde(alias = "longitude")]
    lon: f64,
}

/// Desktop stand-in for a GPS provider: polls an IP geolocation endpoint at
/// the requested interval. Permission comes from configuration.
pub struct IpLocationProvider {
    http: reqwest::Client,
    url: String,
    permission_granted: bool,
    last_fix: Arc<Mutex<Option<LatLong>>>,
    subscriptions: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl IpLocationProvider {
    pub fn new(config: &LocationConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.provider_url.clone(),
            permission_granted: config.permission_granted,
            last_fix: Arc::new(Mutex::new(None)),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    async fn fetch(http: &reqwest::Client, url: &str) -> Result<LatLong, LocationError> {
        let location: IpLocation = http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LocationError::Provider(e.to_string()))?
            .json()
            .await
            .map_err(|e| LocationError::Provider(e.to_string()))?;
        Ok(LatLong::new(location.lat, location.lon))
    }
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    fn check_permission(&self) -> PermissionStatus {
        if self.permission_granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn request_permission(&self) -> PermissionStatus {
        self.check_permission()
    }

    async fn last_location(&self) -> Result<Option<LatLong>, LocationError> {
        if self.check_permission() == PermissionStatus::Denied {
            return Err(LocationError::PermissionDenied);
        }
        let cached = *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner);
        if cached.is_some() {
            return Ok(cached);
        }
        let fix = Self::fetch(&self.http, &self.url).await?;
        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner) = Some(fix);
        Ok(Some(fix))
    }

    async fn request_updates(&self, request: LocationRequest) -> Result<Subscription, LocationError> {
        if self.check_permission() == PermissionStatus::Denied {
            return Err(LocationError::PermissionDenied);
        }

        let id = Uuid::new_v4();
        let (tx, rx) = flume::unbounded();
        let http = self.http.clone();
        let url = self.url.clone();
        let last_fix = self.last_fix.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(request.interval);
            loop {
                ticker.tick().await;
                match Self::fetch(&http, &url).await {
                    Ok(fix) => {
                        *last_fix.lock().unwrap_or_else(PoisonError::into_inner) = Some(fix);
                        if tx.send_async(fix).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "ip_location_fetch_failed"),
                }
            }
        });

        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, task);
        debug!(
            %id,
            interval_s = request.interval.as_secs(),
            priority = ?request.priority,
            "location_updates_requested"
        );

        Ok(Subscription { id, fixes: rx })
    }

    async fn remove_updates(&self, id: Uuid) -> Result<(), LocationError> {
        let task = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or(LocationError::UnknownSubscription(id))?;
        task.abort();
        Ok(())
    }
}

impl Drop for IpLocationProvider {
    fn drop(&mut self) {
        for (_, task) in self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
        {
            task.abort();
        }
    }
}
