//! Test doubles for the controller's collaborators and the metadata provider.

use async_trait::async_trait;
use mockall::mock;
use std::collections::HashSet;
use std::sync::Mutex;

use jukebox::commands::music::audio_sources::MetadataProvider;
use jukebox::commands::music::audio_sources::spotify::{
    SpotifyCategory, SpotifyItem, SpotifyResult, SpotifyTrack,
};
use jukebox::commands::music::audio_sources::track_metadata::TrackMetadata;
use jukebox::commands::music::controller::player::{
    Notice, Notifier, Player, PlayerSnapshot, UserKey,
};
use jukebox::commands::music::controller::surface::ControlSurface;
use jukebox::commands::music::utils::music_manager::{MusicError, MusicResult};
use jukebox::commands::music::utils::queue::RepeatMode;

/// What the controller asked the player to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCall {
    SetPause(bool),
    SetVolume(u8),
    Stop,
    PlayNext,
    Teardown,
    BackTo(usize),
    SkipTo(usize),
    SetRepeat(RepeatMode),
}

#[derive(Debug, Default)]
struct FakeState {
    snapshot: PlayerSnapshot,
    calls: Vec<PlayerCall>,
}

/// In-memory player recording every call.
#[derive(Debug)]
pub struct FakePlayer {
    privileged: HashSet<UserKey>,
    listeners: HashSet<UserKey>,
    quorum: usize,
    leave_quorum: usize,
    fail_stop: bool,
    state: Mutex<FakeState>,
}

impl FakePlayer {
    /// A player with the given listeners and a quorum of 2 for everything.
    pub fn new(listeners: &[UserKey]) -> Self {
        Self {
            privileged: HashSet::new(),
            listeners: listeners.iter().copied().collect(),
            quorum: 2,
            leave_quorum: 2,
            fail_stop: false,
            state: Mutex::new(FakeState {
                snapshot: PlayerSnapshot {
                    volume: 100,
                    ..Default::default()
                },
                calls: Vec::new(),
            }),
        }
    }

    pub fn privileged(mut self, users: &[UserKey]) -> Self {
        self.privileged.extend(users.iter().copied());
        self
    }

    pub fn quorum(mut self, quorum: usize, leave_quorum: usize) -> Self {
        self.quorum = quorum;
        self.leave_quorum = leave_quorum;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn playing(self, track: TrackMetadata) -> Self {
        self.state.lock().unwrap().snapshot.current = Some(track);
        self
    }

    pub fn with_snapshot(self, update: impl FnOnce(&mut PlayerSnapshot)) -> Self {
        update(&mut self.state.lock().unwrap().snapshot);
        self
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn current_snapshot(&self) -> PlayerSnapshot {
        self.state.lock().unwrap().snapshot.clone()
    }

    fn record(&self, call: PlayerCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl Player for FakePlayer {
    async fn is_privileged(&self, user: UserKey) -> bool {
        self.privileged.contains(&user)
    }

    async fn is_listener(&self, user: UserKey) -> bool {
        self.listeners.contains(&user)
    }

    fn channel_mention(&self) -> String {
        "<#500>".to_string()
    }

    async fn required_votes(&self, leave: bool) -> usize {
        if leave { self.leave_quorum } else { self.quorum }
    }

    async fn snapshot(&self) -> PlayerSnapshot {
        self.current_snapshot()
    }

    async fn set_pause(&self, paused: bool) -> MusicResult<()> {
        self.record(PlayerCall::SetPause(paused));
        self.state.lock().unwrap().snapshot.is_paused = paused;
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> MusicResult<()> {
        self.record(PlayerCall::SetVolume(volume));
        self.state.lock().unwrap().snapshot.volume = volume;
        Ok(())
    }

    async fn stop(&self) -> MusicResult<()> {
        self.record(PlayerCall::Stop);
        if self.fail_stop {
            return Err(MusicError::Playback("stop failed".to_string()));
        }
        Ok(())
    }

    async fn play_next(&self) -> MusicResult<()> {
        self.record(PlayerCall::PlayNext);
        Ok(())
    }

    async fn teardown(&self) -> MusicResult<()> {
        self.record(PlayerCall::Teardown);
        Ok(())
    }

    async fn back_to(&self, steps: usize) {
        self.record(PlayerCall::BackTo(steps));
    }

    async fn skip_to(&self, index: usize) {
        self.record(PlayerCall::SkipTo(index));
    }

    async fn set_repeat(&self, mode: RepeatMode) {
        self.record(PlayerCall::SetRepeat(mode));
        self.state.lock().unwrap().snapshot.repeat = mode;
    }
}

/// Keeps every notice and redraw for inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    redraws: Mutex<Vec<ControlSurface>>,
    redrawn: Mutex<Vec<PlayerSnapshot>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.notices.lock().unwrap().iter().map(|n| n.key).collect()
    }

    pub fn redraws(&self) -> Vec<ControlSurface> {
        self.redraws.lock().unwrap().clone()
    }

    /// Player states the message was re-rendered for.
    pub fn redrawn_snapshots(&self) -> Vec<PlayerSnapshot> {
        self.redrawn.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }

    async fn redraw(&self, snapshot: &PlayerSnapshot, surface: ControlSurface) {
        self.redrawn.lock().unwrap().push(snapshot.clone());
        self.redraws.lock().unwrap().push(surface);
    }
}

mock! {
    pub Notifier {}

    #[async_trait]
    impl Notifier for Notifier {
        async fn send(&self, notice: Notice);
        async fn redraw(&self, snapshot: &PlayerSnapshot, surface: ControlSurface);
    }
}

mock! {
    pub Provider {}

    #[async_trait]
    impl MetadataProvider for Provider {
        async fn resolve(&self, url: &str) -> SpotifyResult<SpotifyItem>;
        async fn search(&self, query: &str, limit: u32) -> SpotifyResult<Vec<SpotifyTrack>>;
        async fn recommendations(
            &self,
            seed_tracks: &[String],
            limit: u32,
        ) -> SpotifyResult<Vec<SpotifyTrack>>;
        async fn categories(&self) -> SpotifyResult<Vec<SpotifyCategory>>;
    }
}
