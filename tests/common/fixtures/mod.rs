//! Sample data used across the integration tests.

use serde_json::{Value, json};

use jukebox::commands::music::audio_sources::track_metadata::TrackMetadata;
use jukebox::commands::music::controller::player::UserKey;
use jukebox::config::{CooldownSettings, Settings};

/// Users that are privileged in most scenarios.
pub const DJ: UserKey = UserKey(1);
pub const ALICE: UserKey = UserKey(2);
pub const BOB: UserKey = UserKey(3);
pub const CAROL: UserKey = UserKey(4);
/// Listed in `bot_access_user` by `settings()`.
pub const OWNER: UserKey = UserKey(99);

/// base64("id:secret"), what the grant endpoint must receive.
pub const BASIC_AUTH: &str = "Basic aWQ6c2VjcmV0";

pub fn track(title: &str, requester: UserKey) -> TrackMetadata {
    TrackMetadata::from_query(title, requester, format!("user{}", requester.0))
}

/// Settings with a rate limit generous enough to stay out of the way.
pub fn settings() -> Settings {
    Settings {
        bot_access_user: vec![OWNER.0],
        cooldown: CooldownSettings {
            rate: 100,
            per_secs: 10,
        },
        ..Default::default()
    }
}

pub fn grant(expires_in: i64) -> Value {
    json!({
        "access_token": "token",
        "token_type": "Bearer",
        "expires_in": expires_in
    })
}

pub fn track_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "artists": [{"name": "Artist"}],
        "duration_ms": 180_000,
        "album": {"images": [{"url": format!("https://img/{}", id)}]},
        "external_urls": {"spotify": format!("https://open.spotify.com/track/{}", id)}
    })
}

pub fn playlist_json(id: &str, items: Vec<Value>, next: Option<String>) -> Value {
    json!({
        "id": id,
        "name": "Mix",
        "owner": {"display_name": "dj"},
        "images": [],
        "external_urls": {"spotify": format!("https://open.spotify.com/playlist/{}", id)},
        "tracks": {"items": items, "next": next}
    })
}

/// A playlist entry wrapping `track`, or `null` for removed tracks.
pub fn playlist_item(track: Option<Value>) -> Value {
    json!({ "track": track })
}
