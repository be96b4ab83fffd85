//! A Discord music bot built around a vote-gated interactive controller and a
//! Spotify metadata client.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

pub mod commands;
pub mod config;
pub mod events;

use commands::music::audio_sources::MetadataProvider;
use commands::music::controller::messages::Messages;
use config::Settings;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// HTTP client handed to songbird for streaming audio.
///
/// Only the connect phase is bounded: a stream body stays open for as long as
/// the track plays.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
});

/// User data shared by every command invocation and the component handler.
#[derive(Clone)]
pub struct Data {
    pub settings: Arc<Settings>,
    pub messages: Arc<Messages>,
    pub spotify: Arc<dyn MetadataProvider>,
}
