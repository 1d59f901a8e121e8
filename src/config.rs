use std::{env, path::PathBuf, time::Duration};

use directories::ProjectDirs;

const DEFAULT_CATALOG_URL: &str = "https://deezerdevs-deezer.p.rapidapi.com";
const DEFAULT_SEARCH_TERM: &str = "ed sheeran";
const DEFAULT_REDIRECT_PORT: u16 = 8085;
const DEFAULT_LOCATION_URL: &str = "http://ip-api.com/json";
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "symphony", env!("CARGO_PKG_NAME"))
}

/// Directory for the log file, preferences and the local image bucket.
/// `SYMPHONY_DATA` overrides the platform default.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = env::var("SYMPHONY_DATA") {
        PathBuf::from(dir)
    } else if let Some(dirs) = project_directory() {
        dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub search_term: String,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_port: u16,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Firebase bucket such as `my-app.appspot.com`. Without one, images go to
    /// a directory under the data dir.
    pub firebase_bucket: Option<String>,
    pub local_root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LocationConfig {
    /// Stands in for the runtime permission prompt.
    pub permission_granted: bool,
    pub provider_url: String,
    pub geocoder_url: String,
    pub preferences_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub google: GoogleConfig,
    pub storage: StorageConfig,
    pub location: LocationConfig,
    pub toast_duration: Duration,
}

impl AppConfig {
    pub fn from_env() -> color_eyre::Result<Self> {
        let data = data_dir();

        let redirect_port = match env::var("SYMPHONY_REDIRECT_PORT") {
            Ok(port) => port.parse()?,
            Err(_) => DEFAULT_REDIRECT_PORT,
        };

        Ok(Self {
            catalog: CatalogConfig {
                base_url: var_or("SYMPHONY_CATALOG_URL", DEFAULT_CATALOG_URL),
                api_key: env::var("RAPIDAPI_KEY").ok(),
                search_term: var_or("SYMPHONY_SEARCH_TERM", DEFAULT_SEARCH_TERM),
            },
            google: GoogleConfig {
                client_id: env::var("GOOGLE_CLIENT_ID").ok(),
                client_secret: env::var("GOOGLE_CLIENT_SECRET").ok(),
                redirect_port,
            },
            storage: StorageConfig {
                firebase_bucket: env::var("FIREBASE_STORAGE_BUCKET").ok(),
                local_root: data.join("bucket"),
            },
            location: LocationConfig {
                permission_granted: env::var("SYMPHONY_LOCATION")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(true),
                provider_url: var_or("SYMPHONY_LOCATION_URL", DEFAULT_LOCATION_URL),
                geocoder_url: var_or("SYMPHONY_GEOCODER_URL", DEFAULT_GEOCODER_URL),
                preferences_path: data.join("user_location.json"),
            },
            toast_duration: Duration::from_secs(3),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off" | "deny" | "denied"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_default_to_granted() {
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(parse_flag("anything"));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(" Denied "));
    }
}
