//! `Player` backed by songbird for playback and the serenity cache for
//! channel membership and permissions.

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::commands::music::controller::player::{Player, PlayerSnapshot, UserKey};
use crate::commands::music::controller::privilege::{MemberAccess, is_privileged};
use crate::commands::music::controller::votes::required_votes;
use crate::config::Settings;

use super::music_manager::{MUSIC_MANAGER, MusicManager, MusicResult};
use super::queue::RepeatMode;

/// Someone in the player's voice channel.
#[derive(Debug, Clone, Copy)]
struct Occupant {
    user: UserKey,
    bot: bool,
}

pub struct DiscordPlayer {
    ctx: Context,
    guild_id: GuildId,
    voice_channel: ChannelId,
    settings: Arc<Settings>,
}

impl DiscordPlayer {
    pub fn new(
        ctx: Context,
        guild_id: GuildId,
        voice_channel: ChannelId,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            ctx,
            guild_id,
            voice_channel,
            settings,
        }
    }

    /// Everyone in the voice channel, the bot included.
    fn occupants(&self) -> Vec<Occupant> {
        let Some(guild) = self.ctx.cache.guild(self.guild_id) else {
            warn!("Guild {} missing from cache", self.guild_id);
            return Vec::new();
        };

        guild
            .voice_states
            .values()
            .filter(|state| state.channel_id == Some(self.voice_channel))
            .map(|state| {
                let bot = match &state.member {
                    Some(member) => member.user.bot,
                    None => self
                        .ctx
                        .cache
                        .user(state.user_id)
                        .is_some_and(|user| user.bot),
                };
                Occupant {
                    user: state.user_id.into(),
                    bot,
                }
            })
            .collect()
    }

    fn human_listeners(&self) -> Vec<UserKey> {
        self.occupants()
            .into_iter()
            .filter(|occupant| !occupant.bot)
            .map(|occupant| occupant.user)
            .collect()
    }

    fn member_access(&self, user: UserKey) -> MemberAccess {
        let fallback = MemberAccess {
            user,
            ..Default::default()
        };
        let Some(guild) = self.ctx.cache.guild(self.guild_id) else {
            return fallback;
        };

        let user_id = UserId::new(user.0);
        let member = guild.members.get(&user_id).or_else(|| {
            guild
                .voice_states
                .get(&user_id)
                .and_then(|state| state.member.as_ref())
        });
        let Some(member) = member else {
            debug!("Member {} not cached in guild {}", user, self.guild_id);
            return MemberAccess {
                is_owner: guild.owner_id == user_id,
                ..fallback
            };
        };

        let permissions = guild.member_permissions(member);
        MemberAccess {
            user,
            is_owner: guild.owner_id == user_id,
            manages_guild: permissions.administrator() || permissions.manage_guild(),
            roles: member.roles.iter().map(|role| role.get()).collect(),
        }
    }
}

#[async_trait]
impl Player for DiscordPlayer {
    async fn is_privileged(&self, user: UserKey) -> bool {
        let access = self.member_access(user);
        is_privileged(&access, &self.human_listeners(), &self.settings)
    }

    async fn is_listener(&self, user: UserKey) -> bool {
        self.occupants().iter().any(|occupant| occupant.user == user)
    }

    fn channel_mention(&self) -> String {
        format!("<#{}>", self.voice_channel)
    }

    async fn required_votes(&self, leave: bool) -> usize {
        required_votes(self.occupants().len(), leave, self.settings.vote_disable)
    }

    async fn snapshot(&self) -> PlayerSnapshot {
        MUSIC_MANAGER
            .lock()
            .await
            .snapshot(self.guild_id)
            .unwrap_or_default()
    }

    async fn set_pause(&self, paused: bool) -> MusicResult<()> {
        let mut manager = MUSIC_MANAGER.lock().await;
        let player = manager.player_mut(self.guild_id)?;
        if let Some(handle) = &player.handle {
            if paused {
                handle.pause()?;
            } else {
                handle.play()?;
            }
        }
        player.paused = paused;
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> MusicResult<()> {
        let mut manager = MUSIC_MANAGER.lock().await;
        let player = manager.player_mut(self.guild_id)?;
        if let Some(handle) = &player.handle {
            handle.set_volume(f32::from(volume) / 100.0)?;
        }
        player.volume = volume;
        Ok(())
    }

    async fn stop(&self) -> MusicResult<()> {
        let handle = MUSIC_MANAGER
            .lock()
            .await
            .player(self.guild_id)
            .and_then(|player| player.handle.clone());

        match handle.map(|handle| handle.stop()) {
            Some(Err(songbird::error::ControlError::Finished)) | Some(Ok(())) | None => Ok(()),
            Some(Err(e)) => Err(e.into()),
        }
    }

    async fn play_next(&self) -> MusicResult<()> {
        MusicManager::play_next(&self.ctx, self.guild_id)
            .await
            .map(|_| ())
    }

    async fn teardown(&self) -> MusicResult<()> {
        MusicManager::teardown(&self.ctx, self.guild_id).await
    }

    async fn back_to(&self, steps: usize) {
        if let Ok(player) = MUSIC_MANAGER.lock().await.player_mut(self.guild_id) {
            player.queue.back_to(steps);
        }
    }

    async fn skip_to(&self, index: usize) {
        if let Ok(player) = MUSIC_MANAGER.lock().await.player_mut(self.guild_id) {
            player.queue.skip_to(index);
        }
    }

    async fn set_repeat(&self, mode: RepeatMode) {
        if let Ok(player) = MUSIC_MANAGER.lock().await.player_mut(self.guild_id) {
            player.queue.set_repeat(mode);
        }
    }
}
