//! Where tracks come from: the unified `TrackMetadata` and the metadata
//! providers that resolve links and queries into it.

/// Submodule implementing `MetadataProvider` for Spotify.
pub mod spotify;
/// Submodule defining the `TrackMetadata` struct used across audio sources.
pub mod track_metadata;

use serenity::async_trait;
use spotify::{SpotifyCategory, SpotifyItem, SpotifyResult, SpotifyTrack};
use url::Url;

/// Looks up music metadata for links and queries.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Resolves a track, album, playlist or artist link.
    async fn resolve(&self, url: &str) -> SpotifyResult<SpotifyItem>;

    async fn search(&self, query: &str, limit: u32) -> SpotifyResult<Vec<SpotifyTrack>>;

    /// Tracks similar to the given seed track ids.
    async fn recommendations(
        &self,
        seed_tracks: &[String],
        limit: u32,
    ) -> SpotifyResult<Vec<SpotifyTrack>>;

    async fn categories(&self) -> SpotifyResult<Vec<SpotifyCategory>>;
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// Performs a basic check if the input string can be parsed as a URL.
    /// Does not validate if the URL is actually reachable or supported.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }
}
