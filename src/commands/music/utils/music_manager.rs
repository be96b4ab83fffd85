use poise::serenity_prelude as serenity;
use serenity::all::{CreateMessage, EditMessage, MessageId};
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::YoutubeDl;
use songbird::tracks::TrackHandle;
use songbird::{Call, Event, Songbird, TrackEvent};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::commands::music::audio_sources::spotify::SpotifyError;
use crate::commands::music::audio_sources::track_metadata::{PlaybackSource, TrackMetadata};
use crate::commands::music::controller::InteractiveController;
use crate::commands::music::controller::player::PlayerSnapshot;
use crate::commands::music::controller::render;
use crate::{Data, Error, HTTP_CLIENT};

use super::embedded_messages;
use super::event_handlers::TrackEndNotifier;
use super::queue::PlayerQueue;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Nothing is being played in this guild")]
    NoPlayer,

    #[error("Playback error: {0}")]
    Playback(String),

    #[error(transparent)]
    Spotify(#[from] SpotifyError),
}

impl From<songbird::error::ControlError> for MusicError {
    fn from(err: songbird::error::ControlError) -> Self {
        MusicError::Playback(err.to_string())
    }
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Everything the bot tracks about playback in one guild.
pub struct GuildPlayer {
    pub queue: PlayerQueue,
    pub current: Option<TrackMetadata>,
    pub handle: Option<TrackHandle>,
    pub paused: bool,
    pub volume: u8,
    pub voice_channel: ChannelId,
    /// Channel of the controller message.
    pub text_channel: ChannelId,
    pub message_id: Option<MessageId>,
    pub controller: Arc<InteractiveController>,
}

impl GuildPlayer {
    pub fn new(voice_channel: ChannelId, text_channel: ChannelId, data: &Data) -> Self {
        Self {
            queue: PlayerQueue::new(),
            current: None,
            handle: None,
            paused: false,
            volume: data.settings.default_volume,
            voice_channel,
            text_channel,
            message_id: None,
            controller: Arc::new(InteractiveController::new(
                &data.settings,
                data.messages.clone(),
            )),
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current: self.current.clone(),
            is_paused: self.paused,
            volume: self.volume,
            has_history: self.queue.has_history(),
            upcoming: self.queue.upcoming().to_vec(),
            repeat: self.queue.repeat(),
        }
    }
}

/// Where newly queued tracks ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    /// 1-based position of the first new track among the upcoming ones.
    pub position: usize,
    /// Playback started with the first new track.
    pub started: bool,
}

/// Guild players by guild. Locks on it are never held across Discord calls.
#[derive(Default)]
pub struct MusicManager {
    players: HashMap<GuildId, GuildPlayer>,
}

pub static MUSIC_MANAGER: LazyLock<Arc<Mutex<MusicManager>>> =
    LazyLock::new(|| Arc::new(Mutex::new(MusicManager::default())));

impl MusicManager {
    pub fn player(&self, guild_id: GuildId) -> Option<&GuildPlayer> {
        self.players.get(&guild_id)
    }

    pub fn player_mut(&mut self, guild_id: GuildId) -> MusicResult<&mut GuildPlayer> {
        self.players.get_mut(&guild_id).ok_or(MusicError::NoPlayer)
    }

    pub fn snapshot(&self, guild_id: GuildId) -> Option<PlayerSnapshot> {
        self.player(guild_id).map(GuildPlayer::snapshot)
    }

    /// Get the Songbird voice client from the context
    pub async fn get_songbird(ctx: &Context) -> MusicResult<Arc<Songbird>> {
        songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)
    }

    /// Get the current voice channel call handle
    pub async fn get_call(
        ctx: &Context,
        guild_id: GuildId,
    ) -> MusicResult<Arc<SerenityMutex<Call>>> {
        let songbird = Self::get_songbird(ctx).await?;
        songbird.get(guild_id).ok_or(MusicError::NotConnected)
    }

    /// Join a voice channel
    pub async fn join_channel(
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Arc<SerenityMutex<Call>>> {
        let songbird = Self::get_songbird(ctx).await?;

        songbird
            .join(guild_id, channel_id)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))
    }

    /// Leave a voice channel
    pub async fn leave_channel(ctx: &Context, guild_id: GuildId) -> MusicResult<()> {
        let songbird = Self::get_songbird(ctx).await?;

        if songbird.get(guild_id).is_none() {
            return Err(MusicError::NotConnected);
        }

        songbird
            .remove(guild_id)
            .await
            .map_err(|_| MusicError::JoinError("Failed to leave voice channel".to_string()))
    }

    /// Get the voice channel ID that the user is currently in
    pub fn get_user_voice_channel(
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
    ) -> MusicResult<ChannelId> {
        let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

        let voice_state = guild
            .voice_states
            .get(&user_id)
            .ok_or(MusicError::UserNotInVoiceChannel)?;

        voice_state
            .channel_id
            .ok_or(MusicError::UserNotInVoiceChannel)
    }

    /// Queues `tracks`, joining `voice_channel` and creating the guild player
    /// when needed. Starts playback if nothing is playing.
    pub async fn enqueue(
        ctx: &Context,
        data: &Data,
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
        tracks: Vec<TrackMetadata>,
    ) -> MusicResult<Enqueued> {
        if Self::get_call(ctx, guild_id).await.is_err() {
            info!("Joining voice channel {} in guild {}", voice_channel, guild_id);
            Self::join_channel(ctx, guild_id, voice_channel).await?;
        }

        let (position, idle) = {
            let mut manager = MUSIC_MANAGER.lock().await;
            let player = manager
                .players
                .entry(guild_id)
                .or_insert_with(|| GuildPlayer::new(voice_channel, text_channel, data));

            let position = player.queue.upcoming().len() + 1;
            player.queue.extend(tracks);
            (position, player.current.is_none())
        };

        if idle {
            let started = Self::play_next(ctx, guild_id).await?;
            return Ok(Enqueued { position, started });
        }

        if let Err(e) = Self::refresh_controller_message(ctx, guild_id).await {
            warn!("Failed to refresh controller for guild {}: {}", guild_id, e);
        }
        Ok(Enqueued {
            position,
            started: false,
        })
    }

    /// Starts the next track of the queue. Returns `false` when the queue is
    /// exhausted; the player then idles until something is queued.
    pub async fn play_next(ctx: &Context, guild_id: GuildId) -> MusicResult<bool> {
        let call = Self::get_call(ctx, guild_id).await?;

        let (next, volume, controller) = {
            let mut manager = MUSIC_MANAGER.lock().await;
            let player = manager.player_mut(guild_id)?;
            let next = player.queue.next();
            player.current = next.clone();
            player.handle = None;
            player.paused = false;
            (next, player.volume, player.controller.clone())
        };

        controller.reset_votes().await;

        let Some(track) = next else {
            info!("Queue finished for guild {}", guild_id);
            if let Err(e) = Self::refresh_controller_message(ctx, guild_id).await {
                warn!("Failed to refresh controller for guild {}: {}", guild_id, e);
            }
            return Ok(false);
        };

        info!("Playing '{}' in guild {}", track.title, guild_id);
        let input = match &track.source {
            PlaybackSource::Url(url) => YoutubeDl::new(HTTP_CLIENT.clone(), url.clone()),
            PlaybackSource::Search(query) => {
                YoutubeDl::new_search(HTTP_CLIENT.clone(), query.clone())
            }
        };

        let handle = call.lock().await.play_input(input.into());
        handle.set_volume(f32::from(volume) / 100.0)?;
        for event in [TrackEvent::End, TrackEvent::Error] {
            handle.add_event(
                Event::Track(event),
                TrackEndNotifier {
                    ctx: ctx.clone(),
                    guild_id,
                },
            )?;
        }

        {
            let mut manager = MUSIC_MANAGER.lock().await;
            match manager.player_mut(guild_id) {
                Ok(player) => player.handle = Some(handle),
                Err(_) => {
                    debug!("Player of guild {} went away while starting a track", guild_id);
                    let _ = handle.stop();
                    return Ok(false);
                }
            }
        }

        if let Err(e) = Self::refresh_controller_message(ctx, guild_id).await {
            warn!("Failed to refresh controller for guild {}: {}", guild_id, e);
        }
        Ok(true)
    }

    /// Edits the controller message to match the player state, or sends a new
    /// one when there is none yet or the old one is gone.
    pub async fn refresh_controller_message(ctx: &Context, guild_id: GuildId) -> Result<(), Error> {
        let (snapshot, text_channel, message_id, controller) = {
            let manager = MUSIC_MANAGER.lock().await;
            let player = manager.player(guild_id).ok_or(MusicError::NoPlayer)?;
            (
                player.snapshot(),
                player.text_channel,
                player.message_id,
                player.controller.clone(),
            )
        };

        let embed = embedded_messages::player_embed(&snapshot, controller.messages());
        let components = render::action_rows(&controller.build_surface(&snapshot));

        if let Some(message_id) = message_id {
            let edit = EditMessage::new()
                .embed(embed.clone())
                .components(components.clone());
            match text_channel.edit_message(&ctx.http, message_id, edit).await {
                Ok(_) => return Ok(()),
                Err(e) => debug!("Failed to edit controller message, sending new one: {}", e),
            }
        }

        let message = text_channel
            .send_message(
                &ctx.http,
                CreateMessage::new().embed(embed).components(components),
            )
            .await?;

        if let Ok(player) = MUSIC_MANAGER.lock().await.player_mut(guild_id) {
            player.message_id = Some(message.id);
        }
        Ok(())
    }

    /// Stops playback, forgets the guild player, deletes its controller
    /// message and leaves the voice channel.
    pub async fn teardown(ctx: &Context, guild_id: GuildId) -> MusicResult<()> {
        let player = MUSIC_MANAGER.lock().await.players.remove(&guild_id);

        if let Some(player) = player {
            if let Some(handle) = player.handle {
                match handle.stop() {
                    Ok(_) | Err(songbird::error::ControlError::Finished) => (),
                    Err(e) => warn!("Error stopping track during teardown: {}", e),
                }
            }

            if let Some(message_id) = player.message_id {
                if let Err(e) = player.text_channel.delete_message(&ctx.http, message_id).await {
                    warn!(
                        "Failed to delete controller message {} in channel {}: {}",
                        message_id, player.text_channel, e
                    );
                }
            }
        }

        match Self::leave_channel(ctx, guild_id).await {
            Ok(()) | Err(MusicError::NotConnected) => {
                info!("Player of guild {} torn down", guild_id);
                Ok(())
            }
            Err(e) => {
                error!("Failed to leave voice channel of guild {}: {}", guild_id, e);
                Err(e)
            }
        }
    }
}
