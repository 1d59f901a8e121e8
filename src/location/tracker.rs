use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    location::{
        provider::LocationProvider,
        types::{LatLong, LocationRequest, PermissionStatus},
    },
    state::Observable,
};

struct ActiveSubscription {
    id: Uuid,
    forwarder: JoinHandle<()>,
}

#[derive(Default)]
struct TrackerState {
    epoch: u64,
    active: Option<ActiveSubscription>,
}

/// Follows the device location while the owning screen is visible.
///
/// One tracker per screen; it unsubscribes on [`LocationTracker::stop`] or
/// when dropped. Each fix replaces the published value, no history is kept.
pub struct LocationTracker {
    provider: Arc<dyn LocationProvider>,
    request: LocationRequest,
    location: Observable<Option<LatLong>>,
    inner: Mutex<TrackerState>,
}

impl LocationTracker {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self::with_request(provider, LocationRequest::default())
    }

    pub fn with_request(provider: Arc<dyn LocationProvider>, request: LocationRequest) -> Self {
        Self {
            provider,
            request,
            location: Observable::default(),
            inner: Mutex::new(TrackerState::default()),
        }
    }

    /// `None` until the first fix arrives.
    pub fn location(&self) -> Observable<Option<LatLong>> {
        self.location.clone()
    }

    pub fn current(&self) -> LatLong {
        self.location.get().unwrap_or_default()
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.lock().active.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.lock().epoch == epoch
    }

    pub async fn start<F>(&self, consumer: F)
    where
        F: Fn(LatLong) + Send + Sync + 'static,
    {
        self.stop().await;
        let epoch = self.lock().epoch;

        let mut permission = self.provider.check_permission();
        if permission != PermissionStatus::Granted {
            permission = self.provider.request_permission().await;
        }
        if permission != PermissionStatus::Granted {
            info!("location_permission_denied");
            return;
        }

        let consumer = Arc::new(consumer);
        let deliver = {
            let location = self.location.clone();
            let consumer = consumer.clone();
            move |fix: LatLong| {
                location.set(Some(fix));
                consumer(fix);
            }
        };

        let last = self.provider.last_location().await;
        if !self.is_current(epoch) {
            debug!("location_start_superseded");
            return;
        }
        match last {
            Ok(Some(fix)) => deliver(fix),
            Ok(None) => debug!("location_no_last_fix"),
            Err(e) => warn!(error = %e, "location_last_fix_failed"),
        }

        let subscription = match self.provider.request_updates(self.request).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(error = %e, "location_updates_failed");
                return;
            }
        };

        let fixes = subscription.fixes;
        let forwarder = tokio::spawn(async move {
            while let Ok(fix) = fixes.recv_async().await {
                deliver(fix);
            }
        });

        let stale = {
            let mut state = self.lock();
            if state.epoch == epoch {
                state.active = Some(ActiveSubscription {
                    id: subscription.id,
                    forwarder,
                });
                false
            } else {
                forwarder.abort();
                true
            }
        };

        if stale {
            debug!("location_start_superseded");
            self.remove(subscription.id).await;
        } else {
            info!("location_updates_started");
        }
    }

    /// Tolerates being called with nothing to stop.
    pub async fn stop(&self) {
        let active = {
            let mut state = self.lock();
            state.epoch += 1;
            state.active.take()
        };

        if let Some(active) = active {
            active.forwarder.abort();
            self.remove(active.id).await;
        }
    }

    async fn remove(&self, id: Uuid) {
        match self.provider.remove_updates(id).await {
            Ok(()) => debug!(%id, "location_callback_removed"),
            Err(e) => warn!(%id, error = %e, "location_callback_remove_failed"),
        }
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        let Some(active) = self.lock().active.take() else {
            return;
        };
        active.forwarder.abort();

        let provider = self.provider.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Err(e) = provider.remove_updates(active.id).await {
                    warn!(error = %e, "location_callback_remove_failed");
                }
            });
        }
    }
}
