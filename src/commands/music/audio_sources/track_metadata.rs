//! Defines the `TrackMetadata` struct, the unified representation of a queued
//! track regardless of where it was resolved from.

use std::time::Duration;

use crate::commands::music::controller::player::UserKey;

use super::spotify::SpotifyTrack;

/// Unified representation of metadata for a playable track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    /// The title of the track.
    pub title: String,
    /// Artist(s) or uploader.
    pub author: String,
    /// Link shown to users, if any.
    pub url: Option<String>,
    /// The duration of the track, if known.
    pub duration: Option<Duration>,
    /// URL to a thumbnail image for the track, if available.
    pub thumbnail: Option<String>,
    /// Live streams have no meaningful length.
    pub is_stream: bool,
    /// The user who queued the track.
    pub requester: UserKey,
    /// Display name of the requester.
    pub requester_name: String,
    /// What the audio backend is asked to play.
    pub source: PlaybackSource,
}

/// How the audio for a track is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSource {
    /// A direct link understood by yt-dlp.
    Url(String),
    /// A search query, first result wins.
    Search(String),
}

impl TrackMetadata {
    /// Metadata for a free-text query; the title is the query until playback resolves it.
    pub fn from_query(query: &str, requester: UserKey, requester_name: String) -> Self {
        Self {
            title: query.to_string(),
            author: "Unknown".to_string(),
            url: None,
            duration: None,
            thumbnail: None,
            is_stream: false,
            requester,
            requester_name,
            source: PlaybackSource::Search(query.to_string()),
        }
    }

    /// Metadata for a direct media link.
    pub fn from_url(url: &str, requester: UserKey, requester_name: String) -> Self {
        Self {
            title: url.to_string(),
            author: "Unknown".to_string(),
            url: Some(url.to_string()),
            duration: None,
            thumbnail: None,
            is_stream: false,
            requester,
            requester_name,
            source: PlaybackSource::Url(url.to_string()),
        }
    }

    /// Metadata for a Spotify track. Audio is searched by name and artists.
    pub fn from_spotify(track: &SpotifyTrack, requester: UserKey, requester_name: String) -> Self {
        Self {
            title: track.name.clone(),
            author: track.artists.join(", "),
            url: Some(track.url.clone()),
            duration: Some(track.duration),
            thumbnail: track.image.clone(),
            is_stream: false,
            requester,
            requester_name,
            source: PlaybackSource::Search(track.search_query()),
        }
    }

    /// Track length as `m:ss` / `h:mm:ss`, if known.
    pub fn format_length(&self) -> Option<String> {
        self.duration.map(format_duration)
    }
}

/// Format a duration into a human-readable string (e.g., "3:45" or "1:23:45")
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
