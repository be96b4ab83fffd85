use poise::serenity_prelude as serenity;
use serenity::async_trait;
use songbird::tracks::PlayMode;
use tracing::{debug, error, info, warn};

use super::music_manager::{MusicError, MusicManager};

/// Moves on to the next queued track when the current one ends or fails.
pub struct TrackEndNotifier {
    pub ctx: serenity::Context,
    pub guild_id: serenity::GuildId,
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(tracks) = ctx {
            for (state, _) in tracks.iter() {
                if let PlayMode::Errored(e) = &state.playing {
                    warn!("Track failed in guild {}: {}", self.guild_id, e);
                }
            }
            self.handle_track_end().await;
        }
        None
    }
}

impl TrackEndNotifier {
    async fn handle_track_end(&self) {
        info!("Track ended for guild {}", self.guild_id);

        match MusicManager::play_next(&self.ctx, self.guild_id).await {
            Ok(_) => (),
            // Torn down while the track was stopping.
            Err(MusicError::NoPlayer | MusicError::NotConnected) => {
                debug!("No player left in guild {}", self.guild_id)
            }
            Err(e) => error!("Failed to play next track in guild {}: {}", self.guild_id, e),
        }
    }
}
