//! Tidal API client: catalog search and playlist management.
//!
//! Speaks the v1 API at api.tidal.com using the bearer token held by a
//! [`TidalSession`].  Search backs the matcher's [`CatalogSearch`] seam;
//! the playlist calls are the thin mutation layer around it.  Responses
//! are validated into fixed-shape structs at this boundary; the pipeline
//! never sees raw JSON.

use serde::Deserialize;
use std::collections::HashSet;
use std::error::Error;
use std::time::Duration;

use crate::matcher::{Candidate, CatalogSearch};
use crate::session::TidalSession;

const API_BASE: &str = "https://api.tidal.com/v1";
const USER_AGENT: &str = "tidalbot/0.1";

// ── API response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    items: Vec<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    id: u64,
    title: String,
    artist: Option<ApiArtist>,
    #[serde(default)]
    artists: Vec<ApiArtist>,
    album: Option<ApiAlbum>,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    title: String,
    #[serde(rename = "releaseDate")]
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylist {
    uuid: String,
    title: String,
    #[serde(rename = "numberOfTracks", default)]
    number_of_tracks: u32,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylistPage {
    #[serde(default)]
    items: Vec<ApiPlaylist>,
    #[serde(rename = "totalNumberOfItems", default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct ApiItemsPage {
    #[serde(default)]
    items: Vec<ApiPlaylistItem>,
    #[serde(rename = "totalNumberOfItems", default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylistItem {
    item: ApiTrack,
}

// ── Public types ─────────────────────────────────────────────────────────────

/// A playlist owned by the logged-in user.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub uuid: String,
    pub title: String,
    pub track_count: u32,
}

// ── Client ───────────────────────────────────────────────────────────────────

pub struct TidalClient {
    agent: ureq::Agent,
    session: TidalSession,
}

impl TidalClient {
    pub fn new(session: TidalSession) -> Self {
        TidalClient {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(20))
                .build(),
            session,
        }
    }

    fn get(&self, url: &str) -> ureq::Request {
        self.agent
            .get(url)
            .set("Authorization", &format!("Bearer {}", self.session.access_token))
            .set("User-Agent", USER_AGENT)
    }

    fn post(&self, url: &str) -> ureq::Request {
        self.agent
            .post(url)
            .set("Authorization", &format!("Bearer {}", self.session.access_token))
            .set("User-Agent", USER_AGENT)
    }

    // ── Search ───────────────────────────────────────────────────────────

    /// Free-text track search, capped at `limit` hits.
    pub fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Candidate>, Box<dyn Error>> {
        let url = format!(
            "{}/search/tracks?query={}&limit={}&countryCode={}",
            API_BASE,
            encode_query(query),
            limit,
            self.session.country_code
        );
        let response = self.get(&url).call()?;
        let parsed: ApiSearchResponse = serde_json::from_reader(response.into_reader())?;
        Ok(parsed.items.into_iter().map(track_to_candidate).collect())
    }

    // ── Playlists ────────────────────────────────────────────────────────

    /// All playlists owned by the logged-in user.
    pub fn user_playlists(&self) -> Result<Vec<Playlist>, Box<dyn Error>> {
        let mut playlists = Vec::new();
        let mut offset = 0u64;
        loop {
            let url = format!(
                "{}/users/{}/playlists?limit=50&offset={}&countryCode={}",
                API_BASE, self.session.user_id, offset, self.session.country_code
            );
            let page: ApiPlaylistPage =
                serde_json::from_reader(self.get(&url).call()?.into_reader())?;
            let got = page.items.len() as u64;
            playlists.extend(page.items.into_iter().map(|p| Playlist {
                uuid: p.uuid,
                title: p.title,
                track_count: p.number_of_tracks,
            }));
            offset += got;
            if got == 0 || offset >= page.total {
                break;
            }
        }
        Ok(playlists)
    }

    /// Create an empty playlist.
    pub fn create_playlist(&self, title: &str, description: &str) -> Result<Playlist, Box<dyn Error>> {
        let url = format!(
            "{}/users/{}/playlists?countryCode={}",
            API_BASE, self.session.user_id, self.session.country_code
        );
        let response = self
            .post(&url)
            .send_form(&[("title", title), ("description", description)])?;
        let created: ApiPlaylist = serde_json::from_reader(response.into_reader())?;
        Ok(Playlist {
            uuid: created.uuid,
            title: created.title,
            track_count: created.number_of_tracks,
        })
    }

    /// Find a playlist by exact name, creating it when missing.
    pub fn find_or_create_playlist(&self, name: &str) -> Result<Playlist, Box<dyn Error>> {
        if let Some(existing) = self.user_playlists()?.into_iter().find(|p| p.title == name) {
            println!("Playlist \"{}\" found ({} tracks)", name, existing.track_count);
            return Ok(existing);
        }
        println!("Playlist \"{}\" not found, creating it", name);
        self.create_playlist(name, "Created by tidalbot")
    }

    /// Ids of every track already in the playlist.
    pub fn playlist_track_ids(&self, uuid: &str) -> Result<HashSet<u64>, Box<dyn Error>> {
        let mut ids = HashSet::new();
        let mut offset = 0u64;
        loop {
            let url = format!(
                "{}/playlists/{}/items?limit=100&offset={}&countryCode={}",
                API_BASE, uuid, offset, self.session.country_code
            );
            let page: ApiItemsPage =
                serde_json::from_reader(self.get(&url).call()?.into_reader())?;
            let got = page.items.len() as u64;
            for entry in page.items {
                ids.insert(entry.item.id);
            }
            offset += got;
            if got == 0 || offset >= page.total {
                break;
            }
        }
        Ok(ids)
    }

    /// Append one track by id.  Playlist writes are guarded by an ETag:
    /// fetch the current one and echo it back in If-None-Match.
    pub fn add_track(&self, uuid: &str, track_id: u64) -> Result<(), Box<dyn Error>> {
        let etag = self.playlist_etag(uuid)?;
        let url = format!(
            "{}/playlists/{}/items?countryCode={}",
            API_BASE, uuid, self.session.country_code
        );
        let ids = track_id.to_string();
        self.post(&url)
            .set("If-None-Match", &etag)
            .send_form(&[("trackIds", ids.as_str()), ("onDupes", "FAIL")])?;
        Ok(())
    }

    fn playlist_etag(&self, uuid: &str) -> Result<String, Box<dyn Error>> {
        let url = format!(
            "{}/playlists/{}?countryCode={}",
            API_BASE, uuid, self.session.country_code
        );
        let response = self.get(&url).call()?;
        Ok(response.header("ETag").unwrap_or("*").to_string())
    }
}

impl CatalogSearch for TidalClient {
    fn name(&self) -> &str {
        "Tidal"
    }

    fn search(&self, query: &str, limit: u32) -> Result<Vec<Candidate>, Box<dyn Error>> {
        self.search_tracks(query, limit)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Map a raw API track onto the fixed-shape candidate the pipeline scores.
/// The primary `artist` field wins; older payloads only fill `artists`.
fn track_to_candidate(track: ApiTrack) -> Candidate {
    let ApiTrack {
        id,
        title,
        artist,
        artists,
        album,
    } = track;

    let artist = artist
        .map(|a| a.name)
        .or_else(|| artists.into_iter().next().map(|a| a.name))
        .unwrap_or_default();
    let album_title = album.as_ref().map(|a| a.title.clone());
    let year = album
        .as_ref()
        .and_then(|a| a.release_date.as_deref())
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse().ok());

    Candidate {
        id,
        artist,
        title,
        album: album_title,
        year,
    }
}

/// Minimal percent-encoding for query-string values.
fn encode_query(s: &str) -> String {
    s.replace('%', "%25")
        .replace('&', "%26")
        .replace('+', "%2B")
        .replace('=', "%3D")
        .replace('#', "%23")
        .replace(' ', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_maps_to_candidates() {
        let json = r#"{
            "limit": 5,
            "offset": 0,
            "totalNumberOfItems": 1,
            "items": [{
                "id": 77646437,
                "title": "Bohemian Rhapsody",
                "duration": 354,
                "artist": {"id": 11, "name": "Queen"},
                "artists": [{"id": 11, "name": "Queen"}],
                "album": {"id": 5, "title": "A Night at the Opera", "releaseDate": "1975-11-21"}
            }]
        }"#;
        let parsed: ApiSearchResponse = serde_json::from_str(json).unwrap();
        let candidates: Vec<Candidate> =
            parsed.items.into_iter().map(track_to_candidate).collect();
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.id, 77646437);
        assert_eq!(c.artist, "Queen");
        assert_eq!(c.title, "Bohemian Rhapsody");
        assert_eq!(c.album.as_deref(), Some("A Night at the Opera"));
        assert_eq!(c.year, Some(1975));
    }

    #[test]
    fn test_track_without_primary_artist_falls_back_to_list() {
        let json = r#"{
            "id": 1,
            "title": "Jai",
            "artists": [{"name": "Fideles"}, {"name": "N1RVAAN"}]
        }"#;
        let track: ApiTrack = serde_json::from_str(json).unwrap();
        let c = track_to_candidate(track);
        assert_eq!(c.artist, "Fideles");
        assert!(c.album.is_none());
        assert!(c.year.is_none());
    }

    #[test]
    fn test_unparsable_release_date_drops_year() {
        let json = r#"{
            "id": 2,
            "title": "ID",
            "artist": {"name": "Citizen Kain"},
            "album": {"title": "White Label", "releaseDate": "unknown"}
        }"#;
        let track: ApiTrack = serde_json::from_str(json).unwrap();
        let c = track_to_candidate(track);
        assert_eq!(c.album.as_deref(), Some("White Label"));
        assert!(c.year.is_none());
    }

    #[test]
    fn test_encode_query_escapes_reserved_characters() {
        assert_eq!(
            encode_query("Skrillex & Boys Noize - Fine Day Anthem"),
            "Skrillex%20%26%20Boys%20Noize%20-%20Fine%20Day%20Anthem"
        );
        assert_eq!(encode_query("100% Pure"), "100%25%20Pure");
    }
}
