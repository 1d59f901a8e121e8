pub mod error;
pub mod geocoder;
pub mod preferences;
pub mod provider;
pub mod tracker;
pub mod types;

pub use error::LocationError;
pub use geocoder::{Address, Geocoder, NominatimGeocoder, readable_location};
pub use preferences::LocationPreferences;
pub use provider::{IpLocationProvider, LocationProvider, Subscription};
pub use tracker::LocationTracker;
pub use types::{LatLong, LocationRequest, PermissionStatus, Priority};
