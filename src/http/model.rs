use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub data: Vec<ApiTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiTrack {
    pub title: String,
    #[serde(default)]
    pub preview: String,
    pub album: ApiAlbum,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAlbum {
    #[serde(default)]
    pub cover: String,
}

/// A search hit with only the fields the music screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub title: String,
    pub preview_url: String,
    pub album_cover_url: String,
}

impl From<ApiTrack> for Track {
    fn from(track: ApiTrack) -> Self {
        Self {
            title: track.title,
            preview_url: track.preview,
            album_cover_url: track.album.cover,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_deezer_search_payload() {
        let payload = r#"{
            "data": [
                {
                    "id": 1,
                    "title": "Shape of You",
                    "preview": "https://cdns-preview.dzcdn.net/a.mp3",
                    "artist": { "name": "Ed Sheeran" },
                    "album": { "title": "Divide", "cover": "https://api.deezer.com/album/1/image" }
                },
                {
                    "title": "Perfect",
                    "album": {}
                }
            ],
            "total": 2,
            "next": "https://api.deezer.com/search?q=ed&index=25"
        }"#;

        let response: SearchResponse = serde_json::from_str(payload).unwrap();
        let tracks: Vec<Track> = response.data.into_iter().map(Track::from).collect();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title, "Shape of You");
        assert_eq!(tracks[0].preview_url, "https://cdns-preview.dzcdn.net/a.mp3");
        assert_eq!(tracks[0].album_cover_url, "https://api.deezer.com/album/1/image");
        assert_eq!(tracks[1].preview_url, "");
    }

    #[test]
    fn missing_data_is_an_empty_result() {
        let response: SearchResponse = serde_json::from_str(r#"{"error": {}}"#).unwrap();
        assert!(response.data.is_empty());
    }
}
