use std::time::Duration;

/// A coordinate pair. `(0, 0)` is the default and is also a real place, so
/// "no fix yet" is tracked as `Option<LatLong>` by the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatLong {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLong {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Priority {
    #[default]
    HighAccuracy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub interval: Duration,
    pub fastest_interval: Duration,
    pub max_wait: Duration,
    pub priority: Priority,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            fastest_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(60),
            priority: Priority::HighAccuracy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}
