//! Contracts between the controller and the things it drives: the playback
//! engine (`Player`) and whoever delivers responses to users (`Notifier`).

use serenity::async_trait;
use serenity::model::id::UserId;
use std::fmt;

use crate::commands::music::audio_sources::track_metadata::TrackMetadata;
use crate::commands::music::utils::music_manager::MusicResult;
use crate::commands::music::utils::queue::RepeatMode;

use super::surface::ControlSurface;

/// Opaque, stable identifier of a chat user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserKey(pub u64);

impl UserKey {
    /// Discord mention markup for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl From<UserId> for UserKey {
    fn from(id: UserId) -> Self {
        UserKey(id.get())
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time view of a guild player, enough to lay out the controller
/// and to decide what a button press should do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSnapshot {
    pub current: Option<TrackMetadata>,
    pub is_paused: bool,
    pub volume: u8,
    pub has_history: bool,
    pub upcoming: Vec<TrackMetadata>,
    pub repeat: RepeatMode,
}

impl PlayerSnapshot {
    /// A track is loaded, paused or not.
    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn requester(&self) -> Option<UserKey> {
        self.current.as_ref().map(|track| track.requester)
    }
}

/// A response keyed by message template name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub key: &'static str,
    pub args: Vec<String>,
    pub ephemeral: bool,
}

impl Notice {
    pub fn public(key: &'static str, args: Vec<String>) -> Self {
        Self {
            key,
            args,
            ephemeral: false,
        }
    }

    pub fn ephemeral(key: &'static str, args: Vec<String>) -> Self {
        Self {
            key,
            args,
            ephemeral: true,
        }
    }
}

/// The playback engine of one guild.
#[async_trait]
pub trait Player: Send + Sync {
    /// Whether `user` may act without a vote.
    async fn is_privileged(&self, user: UserKey) -> bool;

    /// Whether `user` is in the player's voice channel.
    async fn is_listener(&self, user: UserKey) -> bool;

    /// Mention markup of the player's voice channel.
    fn channel_mention(&self) -> String;

    /// Votes needed to pass a command. `leave` selects the stricter quorum.
    async fn required_votes(&self, leave: bool) -> usize;

    async fn snapshot(&self) -> PlayerSnapshot;

    async fn set_pause(&self, paused: bool) -> MusicResult<()>;

    async fn set_volume(&self, volume: u8) -> MusicResult<()>;

    /// Stops the current track; the player moves on to the next one.
    async fn stop(&self) -> MusicResult<()>;

    /// Starts the next track from the queue.
    async fn play_next(&self) -> MusicResult<()>;

    /// Stops playback, leaves the channel and drops all state.
    async fn teardown(&self) -> MusicResult<()>;

    /// Moves the queue cursor `steps` tracks back.
    async fn back_to(&self, steps: usize);

    /// Moves the queue cursor so that the 1-based `index` of the upcoming
    /// tracks plays next.
    async fn skip_to(&self, index: usize);

    async fn set_repeat(&self, mode: RepeatMode);
}

/// Delivers controller responses. Failures are the notifier's to log.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notice: Notice);

    /// Re-renders the player message for `snapshot` with the given controls.
    async fn redraw(&self, snapshot: &PlayerSnapshot, surface: ControlSurface);
}
