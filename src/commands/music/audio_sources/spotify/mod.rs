//! Spotify Web API client: resolves links, searches, recommends and lists
//! browse categories. Keeps its own bearer token and refreshes it on expiry.

mod objects;

pub use objects::{
    SpotifyAlbum, SpotifyArtist, SpotifyCategory, SpotifyItem, SpotifyPlaylist, SpotifyTrack,
};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use reqwest::{StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serenity::async_trait;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::MetadataProvider;
use objects::{
    RawAlbum, RawCategories, RawPage, RawPlaylist, RawPlaylistItem, RawSearch, RawTrack,
    RawTrackList, playlist_tracks,
};

pub type SpotifyResult<T> = Result<T, SpotifyError>;

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Error while fetching results: {status} {reason}")]
    Request { status: u16, reason: String },

    #[error("Error fetching bearer token: {0}")]
    Token(String),

    #[error("The Spotify link provided is not valid.")]
    InvalidUrl,

    #[error("This playlist is empty and therefore cannot be queued.")]
    EmptyPlaylist,

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

static SPOTIFY_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://open\.spotify\.com/(?:intl-[a-z]+/)?(?P<type>album|playlist|track|artist)/(?P<id>[a-zA-Z0-9]+)",
    )
    .unwrap()
});

/// Total time budget of a single Spotify request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client-credentials tokens are renewed this long before Spotify expires them.
const EXPIRY_MARGIN_SECS: i64 = 10;

/// Endpoints and credentials. The URLs are overridable so tests can point
/// the client at a local server.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub api_base: String,
    pub grant_url: String,
    pub anonymous_grant_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Market of artist top tracks.
    pub market: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.spotify.com/v1".to_string(),
            grant_url: "https://accounts.spotify.com/api/token".to_string(),
            anonymous_grant_url: "https://open.spotify.com/get_access_token".to_string(),
            client_id: None,
            client_secret: None,
            market: "US".to_string(),
        }
    }
}

impl SpotifyConfig {
    fn credentials(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GrantResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnonymousGrantResponse {
    access_token: String,
    access_token_expiration_timestamp_ms: i64,
}

#[derive(Debug, Clone)]
struct BearerToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Kind and id of a Spotify link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyLink {
    pub kind: String,
    pub id: String,
}

impl SpotifyLink {
    pub fn parse(url: &str) -> Option<Self> {
        SPOTIFY_URL_REGEX.captures(url).map(|caps| Self {
            kind: caps["type"].to_string(),
            id: caps["id"].to_string(),
        })
    }
}

pub struct SpotifyClient {
    http: reqwest::Client,
    config: SpotifyConfig,
    token: Mutex<Option<BearerToken>>,
    categories: Mutex<Vec<SpotifyCategory>>,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> SpotifyResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        if config.credentials().is_none() {
            info!("No Spotify credentials configured, using anonymous tokens");
        }

        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
            categories: Mutex::new(Vec::new()),
        })
    }

    pub fn is_spotify_url(url: &str) -> bool {
        SPOTIFY_URL_REGEX.is_match(url)
    }

    /// A valid bearer token, fetching a new one when missing or expired.
    async fn bearer(&self) -> SpotifyResult<String> {
        let mut token = self.token.lock().await;

        if let Some(current) = token.as_ref() {
            if !current.is_expired(Utc::now()) {
                return Ok(current.token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.token.clone();
        *token = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self) -> SpotifyResult<BearerToken> {
        let response = match self.config.credentials() {
            Some((id, secret)) => {
                let auth = BASE64_STANDARD.encode(format!("{}:{}", id, secret));
                self.http
                    .post(&self.config.grant_url)
                    .header(header::AUTHORIZATION, format!("Basic {}", auth))
                    .form(&[("grant_type", "client_credentials")])
                    .send()
                    .await?
            }
            None => self.http.get(&self.config.anonymous_grant_url).send().await?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::Token(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let token = if self.config.credentials().is_some() {
            let grant: GrantResponse = response.json().await?;
            BearerToken {
                token: grant.access_token,
                expires_at: Utc::now()
                    + TimeDelta::seconds(grant.expires_in - EXPIRY_MARGIN_SECS),
            }
        } else {
            let grant: AnonymousGrantResponse = response.json().await?;
            let expires_at =
                DateTime::from_timestamp_millis(grant.access_token_expiration_timestamp_ms)
                    .ok_or_else(|| {
                        SpotifyError::Token("invalid expiration timestamp".to_string())
                    })?;
            BearerToken {
                token: grant.access_token,
                expires_at,
            }
        };

        debug!("Fetched Spotify token valid until {}", token.expires_at);
        Ok(token)
    }

    async fn send_get(&self, url: &str, token: &str) -> SpotifyResult<reqwest::Response> {
        Ok(self.http.get(url).bearer_auth(token).send().await?)
    }

    /// GET with the bearer token. A 401 drops the token and retries once.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> SpotifyResult<T> {
        let token = self.bearer().await?;
        let mut response = self.send_get(url, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Spotify rejected the bearer token, re-authenticating");
            *self.token.lock().await = None;
            let token = self.bearer().await?;
            response = self.send_get(url, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::Request {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.json().await?)
    }

    /// Follows `next` cursors, appending each page's mapped items.
    async fn follow_pages<R, T, F>(
        &self,
        mut next: Option<String>,
        out: &mut Vec<T>,
        map: F,
    ) -> SpotifyResult<()>
    where
        R: DeserializeOwned,
        F: Fn(Vec<R>) -> Vec<T>,
    {
        while let Some(url) = next {
            let page: RawPage<R> = self.get_json(&url).await?;
            out.extend(map(page.items));
            next = page.next;
        }
        Ok(())
    }

    fn item_url(&self, link: &SpotifyLink) -> String {
        let url = format!("{}/{}s/{}", self.config.api_base, link.kind, link.id);
        if link.kind == "artist" {
            format!("{}/top-tracks?market={}", url, self.config.market)
        } else {
            url
        }
    }

    /// Resolves a track, album, playlist or artist link.
    pub async fn resolve(&self, url: &str) -> SpotifyResult<SpotifyItem> {
        let link = SpotifyLink::parse(url).ok_or(SpotifyError::InvalidUrl)?;
        let request_url = self.item_url(&link);
        info!("Resolving Spotify {} {}", link.kind, link.id);

        match link.kind.as_str() {
            "track" => {
                let raw: RawTrack = self.get_json(&request_url).await?;
                Ok(SpotifyItem::Track(SpotifyTrack::from_raw(raw, None)))
            }
            "album" => {
                let raw: RawAlbum = self.get_json(&request_url).await?;
                let (mut album, next) = SpotifyAlbum::from_raw(raw);
                let image = album.image.clone();
                self.follow_pages(next, &mut album.tracks, |items: Vec<RawTrack>| {
                    items
                        .into_iter()
                        .map(|track| SpotifyTrack::from_raw(track, image.as_deref()))
                        .collect()
                })
                .await?;
                Ok(SpotifyItem::Album(album))
            }
            "artist" => {
                let raw: RawTrackList = self.get_json(&request_url).await?;
                Ok(SpotifyItem::Artist(SpotifyArtist::from_top_tracks(
                    &link.id, raw,
                )))
            }
            _ => {
                let raw: RawPlaylist = self.get_json(&request_url).await?;
                let (mut playlist, next) = SpotifyPlaylist::from_raw(raw);
                if playlist.tracks.is_empty() {
                    return Err(SpotifyError::EmptyPlaylist);
                }
                self.follow_pages(next, &mut playlist.tracks, |items: Vec<RawPlaylistItem>| {
                    playlist_tracks(items)
                })
                .await?;
                debug!(
                    "Playlist {} resolved to {} tracks",
                    playlist.id,
                    playlist.tracks.len()
                );
                Ok(SpotifyItem::Playlist(playlist))
            }
        }
    }

    /// Tracks matching `query`.
    pub async fn track_search(&self, query: &str, limit: u32) -> SpotifyResult<Vec<SpotifyTrack>> {
        let limit = limit.to_string();
        let url = Url::parse_with_params(
            &format!("{}/search", self.config.api_base),
            &[("q", query), ("type", "track"), ("limit", limit.as_str())],
        )?;

        let data: RawSearch = self.get_json(url.as_str()).await?;
        Ok(data
            .tracks
            .items
            .into_iter()
            .map(|track| SpotifyTrack::from_raw(track, None))
            .collect())
    }

    /// Tracks similar to the seed track ids.
    pub async fn similar_tracks(
        &self,
        seed_tracks: &[String],
        limit: u32,
    ) -> SpotifyResult<Vec<SpotifyTrack>> {
        let url = Url::parse_with_params(
            &format!("{}/recommendations", self.config.api_base),
            &[
                ("limit", limit.to_string()),
                ("seed_tracks", seed_tracks.join(",")),
            ],
        )?;

        let data: RawTrackList = self.get_json(url.as_str()).await?;
        Ok(data
            .tracks
            .into_iter()
            .map(|track| SpotifyTrack::from_raw(track, None))
            .collect())
    }

    /// Every browse category. The first full traversal is cached.
    pub async fn categories(&self) -> SpotifyResult<Vec<SpotifyCategory>> {
        let mut cache = self.categories.lock().await;
        if !cache.is_empty() {
            return Ok(cache.clone());
        }

        let mut categories = Vec::new();
        let mut next = Some(format!("{}/browse/categories", self.config.api_base));
        while let Some(url) = next {
            let data: RawCategories = self.get_json(&url).await?;
            categories.extend(data.categories.items.into_iter().map(SpotifyCategory::from));
            next = data.categories.next;
        }

        info!("Cached {} Spotify categories", categories.len());
        *cache = categories.clone();
        Ok(categories)
    }
}

#[async_trait]
impl MetadataProvider for SpotifyClient {
    async fn resolve(&self, url: &str) -> SpotifyResult<SpotifyItem> {
        SpotifyClient::resolve(self, url).await
    }

    async fn search(&self, query: &str, limit: u32) -> SpotifyResult<Vec<SpotifyTrack>> {
        self.track_search(query, limit).await
    }

    async fn recommendations(
        &self,
        seed_tracks: &[String],
        limit: u32,
    ) -> SpotifyResult<Vec<SpotifyTrack>> {
        self.similar_tracks(seed_tracks, limit).await
    }

    async fn categories(&self) -> SpotifyResult<Vec<SpotifyCategory>> {
        SpotifyClient::categories(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(
        "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC",
        "track",
        "4uLU6hMCjMI75M1A2tKUQC"
    )]
    #[test_case(
        "https://open.spotify.com/album/1DFixLWuPkv3KT3TnV35m3?si=abc",
        "album",
        "1DFixLWuPkv3KT3TnV35m3"
    )]
    #[test_case(
        "http://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M",
        "playlist",
        "37i9dQZF1DXcBWIGoYBM5M"
    )]
    #[test_case(
        "https://open.spotify.com/intl-de/artist/0OdUWJ0sBjDrqHygGUXeCF",
        "artist",
        "0OdUWJ0sBjDrqHygGUXeCF"
    )]
    fn test_link_parsing(url: &str, kind: &str, id: &str) {
        assert_eq!(
            SpotifyLink::parse(url),
            Some(SpotifyLink {
                kind: kind.to_string(),
                id: id.to_string()
            })
        );
    }

    #[test_case("https://open.spotify.com/show/abc")]
    #[test_case("https://www.youtube.com/watch?v=abc")]
    #[test_case("never gonna give you up")]
    fn test_unsupported_links(url: &str) {
        assert!(!SpotifyClient::is_spotify_url(url));
    }

    #[test]
    fn test_artist_links_use_top_tracks_of_market() {
        let client = SpotifyClient::new(SpotifyConfig {
            market: "DE".to_string(),
            ..Default::default()
        })
        .unwrap();
        let link = SpotifyLink::parse("https://open.spotify.com/artist/xyz").unwrap();

        assert_eq!(
            client.item_url(&link),
            "https://api.spotify.com/v1/artists/xyz/top-tracks?market=DE"
        );
    }

    #[test]
    fn test_token_expiry_is_inclusive() {
        let now = Utc::now();
        let token = BearerToken {
            token: "t".to_string(),
            expires_at: now,
        };
        assert!(token.is_expired(now));
        assert!(!token.is_expired(now - TimeDelta::seconds(1)));
    }
}
