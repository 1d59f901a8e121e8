mod error;
mod model;

pub use error::CatalogError;
pub use model::Track;

use async_trait::async_trait;
use model::SearchResponse;
use reqwest::Url;
use tracing::{debug, info};

use crate::config::CatalogConfig;

const RAPIDAPI_HOST_HEADER: &str = "X-RapidAPI-Host";
const RAPIDAPI_KEY_HEADER: &str = "X-RapidAPI-Key";

/// Source of tracks for the music screen.
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    async fn search(&self, term: &str) -> Result<Vec<Track>, CatalogError>;

    /// Raw bytes of an album cover linked from a [`Track`].
    async fn cover(&self, url: &str) -> Result<Vec<u8>, CatalogError>;
}

/// Thin client for the Deezer search endpoint exposed through RapidAPI.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    host: Option<String>,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            host: host_header(&config.base_url),
        }
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Track>, CatalogError> {
        let url = format!("{}/search", self.base_url);
        let mut request = self.client.get(&url).query(&[("q", term)]);
        if let Some(key) = &self.api_key {
            request = request.header(RAPIDAPI_KEY_HEADER, key);
            if let Some(host) = &self.host {
                request = request.header(RAPIDAPI_HOST_HEADER, host);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(term, %status, "catalog_search_rejected");
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        let tracks: Vec<Track> = body.data.into_iter().map(Track::from).collect();
        info!(term, count = tracks.len(), "catalog_search_completed");
        Ok(tracks)
    }

    pub async fn cover(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(url, %status, "catalog_cover_rejected");
            return Err(CatalogError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// `host[:port]` of the base URL, sent as the RapidAPI host header.
fn host_header(base_url: &str) -> Option<String> {
    let url = Url::parse(base_url).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[async_trait]
impl MusicCatalog for CatalogClient {
    async fn search(&self, term: &str) -> Result<Vec<Track>, CatalogError> {
        CatalogClient::search(self, term).await
    }

    async fn cover(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        CatalogClient::cover(self, url).await
    }
}
