//! Spotify Web API payloads and the objects the bot builds from them.
//! Only the fields the bot displays or plays are mapped.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub(crate) struct RawNamed {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAlbumRef {
    #[serde(default)]
    pub images: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<RawNamed>,
    #[serde(default)]
    pub duration_ms: u64,
    pub album: Option<RawAlbumRef>,
    #[serde(default)]
    pub external_urls: RawExternalUrls,
}

/// One page of a paginated collection. `next` is the absolute URL of the
/// following page.
#[derive(Debug, Deserialize)]
pub(crate) struct RawPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Playlist entries wrap the track; local files and removed tracks come back
/// as `null`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawPlaylistItem {
    pub track: Option<RawTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<RawNamed>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub external_urls: RawExternalUrls,
    pub tracks: RawPage<RawTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawOwner {
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlaylist {
    pub id: String,
    pub name: String,
    pub owner: Option<RawOwner>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub external_urls: RawExternalUrls,
    pub tracks: RawPage<RawPlaylistItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrackList {
    pub tracks: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSearch {
    pub tracks: RawPage<RawTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icons: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCategories {
    pub categories: RawPage<RawCategory>,
}

fn first_image(images: &[RawImage]) -> Option<String> {
    images.first().map(|image| image.url.clone())
}

fn names(named: Vec<RawNamed>) -> Vec<String> {
    named.into_iter().map(|n| n.name).collect()
}

fn link(kind: &str, id: &str, external: RawExternalUrls) -> String {
    external
        .spotify
        .unwrap_or_else(|| format!("https://open.spotify.com/{}/{}", kind, id))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotifyTrack {
    /// `None` for local files.
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<String>,
    pub duration: Duration,
    pub image: Option<String>,
    pub url: String,
}

impl SpotifyTrack {
    /// Album tracks carry no album of their own; `fallback_image` is the
    /// album cover then.
    pub(crate) fn from_raw(raw: RawTrack, fallback_image: Option<&str>) -> Self {
        let image = raw
            .album
            .as_ref()
            .and_then(|album| first_image(&album.images))
            .or_else(|| fallback_image.map(str::to_string));
        let url = link("track", raw.id.as_deref().unwrap_or_default(), raw.external_urls);

        Self {
            id: raw.id,
            name: raw.name,
            artists: names(raw.artists),
            duration: Duration::from_millis(raw.duration_ms),
            image,
            url,
        }
    }

    /// Query used to find the audio of this track.
    pub fn search_query(&self) -> String {
        format!("{} by {} audio", self.name, self.artists.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotifyAlbum {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub image: Option<String>,
    pub url: String,
    pub tracks: Vec<SpotifyTrack>,
}

impl SpotifyAlbum {
    /// The album with the tracks of its first page.
    pub(crate) fn from_raw(raw: RawAlbum) -> (Self, Option<String>) {
        let image = first_image(&raw.images);
        let tracks = raw
            .tracks
            .items
            .into_iter()
            .map(|track| SpotifyTrack::from_raw(track, image.as_deref()))
            .collect();
        let album = Self {
            url: link("album", &raw.id, raw.external_urls),
            id: raw.id,
            name: raw.name,
            artists: names(raw.artists),
            image,
            tracks,
        };
        (album, raw.tracks.next)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub image: Option<String>,
    pub url: String,
    pub tracks: Vec<SpotifyTrack>,
}

impl SpotifyPlaylist {
    /// The playlist with the tracks of its first page.
    pub(crate) fn from_raw(raw: RawPlaylist) -> (Self, Option<String>) {
        let playlist = Self {
            url: link("playlist", &raw.id, raw.external_urls),
            id: raw.id,
            name: raw.name,
            owner: raw.owner.and_then(|owner| owner.display_name),
            image: first_image(&raw.images),
            tracks: playlist_tracks(raw.tracks.items),
        };
        (playlist, raw.tracks.next)
    }
}

/// Drops entries whose track is `null`.
pub(crate) fn playlist_tracks(items: Vec<RawPlaylistItem>) -> Vec<SpotifyTrack> {
    items
        .into_iter()
        .filter_map(|item| item.track)
        .map(|track| SpotifyTrack::from_raw(track, None))
        .collect()
}

/// An artist link resolves to the artist's top tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    pub url: String,
    pub tracks: Vec<SpotifyTrack>,
}

impl SpotifyArtist {
    pub(crate) fn from_top_tracks(id: &str, raw: RawTrackList) -> Self {
        let tracks: Vec<SpotifyTrack> = raw
            .tracks
            .into_iter()
            .map(|track| SpotifyTrack::from_raw(track, None))
            .collect();
        let name = tracks
            .first()
            .and_then(|track| track.artists.first().cloned())
            .unwrap_or_else(|| "Unknown Artist".to_string());

        Self {
            id: id.to_string(),
            name,
            url: format!("https://open.spotify.com/artist/{}", id),
            tracks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyCategory {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
}

impl From<RawCategory> for SpotifyCategory {
    fn from(raw: RawCategory) -> Self {
        Self {
            icon: first_image(&raw.icons),
            id: raw.id,
            name: raw.name,
        }
    }
}

/// Whatever a Spotify link points at.
#[derive(Debug, Clone, PartialEq)]
pub enum SpotifyItem {
    Track(SpotifyTrack),
    Album(SpotifyAlbum),
    Playlist(SpotifyPlaylist),
    Artist(SpotifyArtist),
}

impl SpotifyItem {
    pub fn name(&self) -> &str {
        match self {
            SpotifyItem::Track(track) => &track.name,
            SpotifyItem::Album(album) => &album.name,
            SpotifyItem::Playlist(playlist) => &playlist.name,
            SpotifyItem::Artist(artist) => &artist.name,
        }
    }

    /// The playable tracks, in order.
    pub fn into_tracks(self) -> Vec<SpotifyTrack> {
        match self {
            SpotifyItem::Track(track) => vec![track],
            SpotifyItem::Album(album) => album.tracks,
            SpotifyItem::Playlist(playlist) => playlist.tracks,
            SpotifyItem::Artist(artist) => artist.tracks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_track_maps_display_fields() {
        let raw: RawTrack = serde_json::from_value(json!({
            "id": "t1",
            "name": "Song",
            "artists": [{"name": "A"}, {"name": "B"}],
            "duration_ms": 201_500,
            "album": {"images": [{"url": "https://img/big"}, {"url": "https://img/small"}]},
            "external_urls": {"spotify": "https://open.spotify.com/track/t1"}
        }))
        .unwrap();

        let track = SpotifyTrack::from_raw(raw, None);

        assert_eq!(track.artists, vec!["A", "B"]);
        assert_eq!(track.duration, Duration::from_millis(201_500));
        assert_eq!(track.image.as_deref(), Some("https://img/big"));
        assert_eq!(track.search_query(), "Song by A, B audio");
    }

    #[test]
    fn test_album_tracks_fall_back_to_album_cover() {
        let raw: RawAlbum = serde_json::from_value(json!({
            "id": "al",
            "name": "Record",
            "artists": [{"name": "A"}],
            "images": [{"url": "https://img/cover"}],
            "tracks": {
                "items": [{"id": "t1", "name": "One", "duration_ms": 1000}],
                "next": "https://api.spotify.com/v1/albums/al/tracks?offset=1"
            }
        }))
        .unwrap();

        let (album, next) = SpotifyAlbum::from_raw(raw);

        assert_eq!(album.url, "https://open.spotify.com/album/al");
        assert_eq!(album.tracks[0].image.as_deref(), Some("https://img/cover"));
        assert_eq!(album.tracks[0].url, "https://open.spotify.com/track/t1");
        assert!(next.is_some());
    }

    #[test]
    fn test_playlist_skips_null_tracks() {
        let items: Vec<RawPlaylistItem> = serde_json::from_value(json!([
            {"track": {"id": "t1", "name": "One", "duration_ms": 1000}},
            {"track": null},
            {"track": {"id": null, "name": "Local", "duration_ms": 0}}
        ]))
        .unwrap();

        let tracks = playlist_tracks(items);

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].id, None);
    }

    #[test]
    fn test_artist_named_after_first_top_track() {
        let raw: RawTrackList = serde_json::from_value(json!({
            "tracks": [{"id": "t1", "name": "Hit", "artists": [{"name": "Band"}], "duration_ms": 1}]
        }))
        .unwrap();

        let artist = SpotifyArtist::from_top_tracks("ar", raw);

        assert_eq!(artist.name, "Band");
        assert_eq!(SpotifyItem::Artist(artist).into_tracks().len(), 1);
    }
}
