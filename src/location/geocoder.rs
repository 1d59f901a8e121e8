use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::location::{error::LocationError, types::LatLong};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub line: String,
    pub locality: Option<String>,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, at: LatLong) -> Result<Option<Address>, LocationError>;
}

/// "address line, locality", or an empty string when nothing is known.
pub async fn readable_location(geocoder: &dyn Geocoder, at: LatLong) -> String {
    match geocoder.reverse(at).await {
        Ok(Some(address)) => match address.locality {
            Some(locality) => format!("{}, {}", address.line, locality),
            None => address.line,
        },
        Ok(None) => String::new(),
        Err(e) => {
            debug!(error = %e, "geolocation_lookup_failed");
            String::new()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

impl ReverseResponse {
    fn into_address(self) -> Option<Address> {
        let line = self.display_name?;
        let locality = self
            .address
            .and_then(|a| a.city.or(a.town).or(a.village));
        Some(Address { line, locality })
    }
}

/// Reverse geocoding against an OpenStreetMap Nominatim instance.
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, at: LatLong) -> Result<Option<Address>, LocationError> {
        let response: ReverseResponse = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LocationError::Geocoding(e.to_string()))?
            .json()
            .await
            .map_err(|e| LocationError::Geocoding(e.to_string()))?;

        Ok(response.into_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Option<Address>, LocationError>);

    #[async_trait]
    impl Geocoder for Fixed {
        async fn reverse(&self, _at: LatLong) -> Result<Option<Address>, LocationError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn formats_line_and_locality() {
        let geocoder = Fixed(Ok(Some(Address {
            line: "10 Downing Street".to_string(),
            locality: Some("London".to_string()),
        })));
        assert_eq!(
            readable_location(&geocoder, LatLong::default()).await,
            "10 Downing Street, London"
        );
    }

    #[tokio::test]
    async fn failures_render_empty() {
        let failing = Fixed(Err(LocationError::Geocoding("offline".into())));
        let empty = Fixed(Ok(None));
        assert_eq!(readable_location(&failing, LatLong::default()).await, "");
        assert_eq!(readable_location(&empty, LatLong::default()).await, "");
    }

    #[test]
    fn parses_nominatim_payload() {
        let response: ReverseResponse = serde_json::from_str(
            r#"{"display_name": "Alexanderplatz, Mitte, Berlin", "address": {"town": "Mitte"}}"#,
        )
        .unwrap();
        assert_eq!(
            response.into_address(),
            Some(Address {
                line: "Alexanderplatz, Mitte, Berlin".to_string(),
                locality: Some("Mitte".to_string()),
            })
        );

        let ocean: ReverseResponse = serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        assert_eq!(ocean.into_address(), None);
    }
}
