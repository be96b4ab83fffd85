//! Common test utilities, fixtures, and mocks shared by the integration tests.
#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

use std::sync::Once;
use tracing::Level;

use jukebox::commands::music::audio_sources::spotify::SpotifyConfig;

static INIT: Once = Once::new();

/// Initialize tracing for tests
pub fn init() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .init();
    });
}

/// Spotify endpoints pointing at a mock server, with client credentials.
pub fn spotify_config(server_uri: &str) -> SpotifyConfig {
    SpotifyConfig {
        api_base: format!("{}/v1", server_uri),
        grant_url: format!("{}/api/token", server_uri),
        anonymous_grant_url: format!("{}/get_access_token", server_uri),
        client_id: Some("id".to_string()),
        client_secret: Some("secret".to_string()),
        market: "US".to_string(),
    }
}
