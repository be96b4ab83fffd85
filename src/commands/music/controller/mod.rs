//! The interactive player controller: who may press which button, and what
//! pressing it does.

pub mod cooldown;
pub mod messages;
pub mod player;
pub mod privilege;
pub mod render;
pub mod surface;
pub mod votes;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::commands::music::utils::music_manager::MusicError;
use crate::commands::music::utils::queue::RepeatMode;
use crate::config::{ControllerGrid, Settings};

use cooldown::RateLimiter;
use messages::Messages;
use player::{Notice, Notifier, Player, PlayerSnapshot, UserKey};
use surface::{ControlKind, ControlSurface};
use votes::{Ballot, Decision, VoteKind, VoteSessions, privileged_only};

/// Step of the volume buttons, in percent.
pub const VOLUME_STEP: u8 = 20;
/// Loudest volume the buttons allow.
pub const MAX_VOLUME: u8 = 150;

/// A press on one of the controller's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlInteraction {
    pub user: UserKey,
    pub kind: ControlKind,
    /// Chosen 1-based index of the track dropdown.
    pub selection: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("user is on cooldown for {retry_after:?}")]
    CooldownExceeded { retry_after: Duration },

    #[error("{user} is not in {channel}")]
    NotInChannel { user: UserKey, channel: String },

    #[error(transparent)]
    Music(#[from] MusicError),
}

impl ControllerError {
    /// The ephemeral response the user gets for this error.
    pub fn notice(&self) -> Notice {
        match self {
            ControllerError::CooldownExceeded { retry_after } => {
                let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
                let plural = if secs == 1 { "" } else { "s" };
                Notice::ephemeral("cooldown", vec![secs.to_string(), plural.to_string()])
            }
            ControllerError::NotInChannel { user, channel } => {
                Notice::ephemeral("notInChannel", vec![user.mention(), channel.clone()])
            }
            ControllerError::Music(_) => Notice::ephemeral("actionFailed", Vec::new()),
        }
    }
}

/// Per-guild controller state. Shared between every press on the player
/// message of that guild.
pub struct InteractiveController {
    votes: Mutex<VoteSessions>,
    limiter: RateLimiter,
    bot_access: HashSet<UserKey>,
    grid: ControllerGrid,
    default_volume: u8,
    messages: Arc<Messages>,
}

impl InteractiveController {
    pub fn new(settings: &Settings, messages: Arc<Messages>) -> Self {
        Self {
            votes: Mutex::new(VoteSessions::new()),
            limiter: RateLimiter::new(settings.cooldown.rate, settings.cooldown.window()),
            bot_access: settings
                .bot_access_user
                .iter()
                .copied()
                .map(UserKey)
                .collect(),
            grid: settings.controller.clone(),
            default_volume: settings.default_volume,
            messages,
        }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Lays out the configured grid for the given player state.
    pub fn build_surface(&self, snapshot: &PlayerSnapshot) -> ControlSurface {
        surface::build_surface(&self.grid, snapshot, &self.messages)
    }

    /// Drops every pending vote. Called when a new track starts.
    pub async fn reset_votes(&self) {
        self.votes.lock().await.clear_all();
    }

    pub async fn handle(
        &self,
        interaction: ControlInteraction,
        player: &dyn Player,
        notifier: &dyn Notifier,
    ) -> Result<(), ControllerError> {
        self.handle_at(interaction, player, notifier, Instant::now())
            .await
    }

    /// Same as [`handle`](Self::handle) with an explicit clock for the rate limiter.
    pub async fn handle_at(
        &self,
        interaction: ControlInteraction,
        player: &dyn Player,
        notifier: &dyn Notifier,
        now: Instant,
    ) -> Result<(), ControllerError> {
        self.check_interaction(interaction.user, player, now).await?;

        debug!("Controller press {:?} by {}", interaction.kind, interaction.user);

        let user = interaction.user;
        match interaction.kind {
            ControlKind::Back => self.back(user, player, notifier).await,
            ControlKind::Resume => self.toggle_pause(user, player, notifier).await,
            ControlKind::Skip => self.skip(user, player, notifier).await,
            ControlKind::Stop => self.stop(user, player, notifier).await,
            ControlKind::Loop => self.cycle_repeat(user, player, notifier).await,
            ControlKind::VolumeUp => self.change_volume(user, player, notifier, true).await,
            ControlKind::VolumeDown => self.change_volume(user, player, notifier, false).await,
            ControlKind::VolumeMute => self.toggle_mute(user, player, notifier).await,
            ControlKind::Tracks => {
                self.select_track(user, interaction.selection, player, notifier)
                    .await
            }
        }
    }

    /// Bot access users always pass; everyone else must be listening and
    /// within their interaction budget.
    async fn check_interaction(
        &self,
        user: UserKey,
        player: &dyn Player,
        now: Instant,
    ) -> Result<(), ControllerError> {
        if self.bot_access.contains(&user) {
            return Ok(());
        }

        if !player.is_listener(user).await {
            return Err(ControllerError::NotInChannel {
                user,
                channel: player.channel_mention(),
            });
        }

        self.limiter
            .check(user, now)
            .map_err(|retry_after| ControllerError::CooldownExceeded { retry_after })
    }

    /// Puts a vote-gated command through the vote sessions. Returns whether
    /// the command may run; otherwise the user has already been answered.
    async fn vote(
        &self,
        user: UserKey,
        kind: VoteKind,
        snapshot: &PlayerSnapshot,
        player: &dyn Player,
        notifier: &dyn Notifier,
    ) -> bool {
        let privileged = player.is_privileged(user).await;
        let quorum = player.required_votes(kind.is_leave()).await;

        let decision = self.votes.lock().await.authorize(Ballot {
            user,
            kind,
            privileged,
            quorum,
            requester: snapshot.requester(),
        });

        match decision {
            Decision::Allowed => true,
            Decision::VoteRecorded { count, required } => {
                notifier
                    .send(Notice::public(
                        kind.vote_message(),
                        vec![user.mention(), count.to_string(), required.to_string()],
                    ))
                    .await;
                false
            }
            Decision::AlreadyVoted => {
                notifier.send(Notice::ephemeral("voted", Vec::new())).await;
                false
            }
            Decision::Denied(_) => {
                notifier
                    .send(Notice::ephemeral("missingPerms_function", Vec::new()))
                    .await;
                false
            }
        }
    }

    /// Gate for the commands reserved to privileged users.
    async fn require_privilege(
        &self,
        user: UserKey,
        player: &dyn Player,
        notifier: &dyn Notifier,
        denied_key: &'static str,
    ) -> bool {
        match privileged_only(player.is_privileged(user).await) {
            Decision::Allowed => true,
            _ => {
                notifier.send(Notice::ephemeral(denied_key, Vec::new())).await;
                false
            }
        }
    }

    /// Track repeat would replay the track being left behind.
    async fn leave_track_repeat(&self, snapshot: &PlayerSnapshot, player: &dyn Player) {
        if snapshot.repeat == RepeatMode::Track {
            player.set_repeat(RepeatMode::Off).await;
        }
    }

    async fn back(
        &self,
        user: UserKey,
        player: &dyn Player,
        notifier: &dyn Notifier,
    ) -> Result<(), ControllerError> {
        let snapshot = player.snapshot().await;
        if !self.vote(user, VoteKind::Back, &snapshot, player, notifier).await {
            return Ok(());
        }

        notifier
            .send(Notice::public("backed", vec![user.mention()]))
            .await;
        self.leave_track_repeat(&snapshot, player).await;

        if snapshot.is_playing() {
            player.back_to(2).await;
            player.stop().await?;
        } else {
            player.back_to(1).await;
            player.play_next().await?;
        }
        Ok(())
    }

    async fn toggle_pause(
        &self,
        user: UserKey,
        player: &dyn Player,
        notifier: &dyn Notifier,
    ) -> Result<(), ControllerError> {
        let snapshot = player.snapshot().await;
        if !snapshot.is_playing() {
            notifier
                .send(Notice::ephemeral("noTrackPlaying", Vec::new()))
                .await;
            return Ok(());
        }

        let kind = if snapshot.is_paused {
            VoteKind::Resume
        } else {
            VoteKind::Pause
        };
        if !self.vote(user, kind, &snapshot, player, notifier).await {
            return Ok(());
        }

        player.set_pause(kind == VoteKind::Pause).await?;
        let snapshot = player.snapshot().await;
        notifier.redraw(&snapshot, self.build_surface(&snapshot)).await;
        Ok(())
    }

    async fn skip(
        &self,
        user: UserKey,
        player: &dyn Player,
        notifier: &dyn Notifier,
    ) -> Result<(), ControllerError> {
        let snapshot = player.snapshot().await;
        if !snapshot.is_playing() {
            notifier
                .send(Notice::ephemeral("noTrackPlaying", Vec::new()))
                .await;
            return Ok(());
        }

        if !self.vote(user, VoteKind::Skip, &snapshot, player, notifier).await {
            return Ok(());
        }

        notifier
            .send(Notice::public("skipped", vec![user.mention()]))
            .await;
        self.leave_track_repeat(&snapshot, player).await;
        player.stop().await?;
        Ok(())
    }

    async fn stop(
        &self,
        user: UserKey,
        player: &dyn Player,
        notifier: &dyn Notifier,
    ) -> Result<(), ControllerError> {
        let snapshot = player.snapshot().await;
        if !self.vote(user, VoteKind::Stop, &snapshot, player, notifier).await {
            return Ok(());
        }

        info!("Player stopped by {}", user);
        notifier
            .send(Notice::public("left", vec![user.mention()]))
            .await;
        player.teardown().await?;
        Ok(())
    }

    async fn cycle_repeat(
        &self,
        user: UserKey,
        player: &dyn Player,
        notifier: &dyn Notifier,
    ) -> Result<(), ControllerError> {
        if !self
            .require_privilege(user, player, notifier, "missingPerms_mode")
            .await
        {
            return Ok(());
        }

        let mode = player.snapshot().await.repeat.cycle();
        player.set_repeat(mode).await;
        notifier
            .send(Notice::public("repeat", vec![mode.to_string()]))
            .await;
        Ok(())
    }

    async fn change_volume(
        &self,
        user: UserKey,
        player: &dyn Player,
        notifier: &dyn Notifier,
        louder: bool,
    ) -> Result<(), ControllerError> {
        if !self
            .require_privilege(user, player, notifier, "missingPerms_function")
            .await
        {
            return Ok(());
        }

        let current = player.snapshot().await.volume;
        let volume = if louder {
            current.saturating_add(VOLUME_STEP).min(MAX_VOLUME)
        } else {
            current.saturating_sub(VOLUME_STEP)
        };

        player.set_volume(volume).await?;
        notifier
            .send(Notice::ephemeral("setVolume", vec![volume.to_string()]))
            .await;
        Ok(())
    }

    async fn toggle_mute(
        &self,
        user: UserKey,
        player: &dyn Player,
        notifier: &dyn Notifier,
    ) -> Result<(), ControllerError> {
        if !self
            .require_privilege(user, player, notifier, "missingPerms_function")
            .await
        {
            return Ok(());
        }

        let volume = if player.snapshot().await.volume > 0 {
            0
        } else {
            self.default_volume
        };

        player.set_volume(volume).await?;
        let snapshot = player.snapshot().await;
        notifier.redraw(&snapshot, self.build_surface(&snapshot)).await;
        Ok(())
    }

    async fn select_track(
        &self,
        user: UserKey,
        selection: Option<usize>,
        player: &dyn Player,
        notifier: &dyn Notifier,
    ) -> Result<(), ControllerError> {
        if !self
            .require_privilege(user, player, notifier, "missingPerms_function")
            .await
        {
            return Ok(());
        }

        let snapshot = player.snapshot().await;
        let Some(index) = selection.filter(|i| (1..=snapshot.upcoming.len()).contains(i)) else {
            debug!("Ignoring track selection {:?}", selection);
            return Ok(());
        };

        notifier
            .send(Notice::public("skipped", vec![user.mention()]))
            .await;
        self.leave_track_repeat(&snapshot, player).await;
        player.skip_to(index).await;

        if snapshot.is_playing() {
            player.stop().await?;
        } else {
            player.play_next().await?;
        }
        Ok(())
    }
}
