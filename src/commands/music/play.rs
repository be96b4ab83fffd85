use poise::CreateReply;
use tracing::{error, info};

use crate::commands::music::audio_sources::spotify::SpotifyClient;
use crate::commands::music::audio_sources::track_metadata::TrackMetadata;
use crate::commands::music::audio_sources::{AudioSource, MetadataProvider};
use crate::commands::music::controller::player::UserKey;
use crate::commands::music::utils::embedded_messages;
use crate::commands::music::utils::music_manager::{MusicError, MusicManager, MusicResult};
use crate::{CommandResult, Context};

/// Turns what the user typed into queueable tracks: Spotify links through
/// the metadata provider, other links as-is, anything else as a search.
pub async fn resolve_query(
    provider: &dyn MetadataProvider,
    query: &str,
    requester: UserKey,
    requester_name: &str,
) -> MusicResult<Vec<TrackMetadata>> {
    let query = query.trim();

    if SpotifyClient::is_spotify_url(query) {
        let item = provider.resolve(query).await?;
        info!("Resolved Spotify link to '{}'", item.name());
        return Ok(item
            .into_tracks()
            .iter()
            .map(|track| TrackMetadata::from_spotify(track, requester, requester_name.to_string()))
            .collect());
    }

    if AudioSource::is_url(query) {
        return Ok(vec![TrackMetadata::from_url(
            query,
            requester,
            requester_name.to_string(),
        )]);
    }

    Ok(vec![TrackMetadata::from_query(
        query,
        requester,
        requester_name.to_string(),
    )])
}

/// Play a song from a link, a Spotify track/album/playlist/artist, or a search
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"] query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    let author_id = ctx.author().id;
    let voice_channel =
        match MusicManager::get_user_voice_channel(ctx.serenity_context(), guild_id, author_id) {
            Ok(channel_id) => channel_id,
            Err(err) => {
                ctx.send(embedded_messages::error(format!(
                    "You need to be in a voice channel: {}",
                    err
                )))
                .await?;
                return Ok(());
            }
        };

    // Resolving playlists may take a while
    ctx.defer().await?;

    let author = ctx.author();
    let tracks = match resolve_query(
        ctx.data().spotify.as_ref(),
        &query,
        author.id.into(),
        author.display_name(),
    )
    .await
    {
        Ok(tracks) => tracks,
        Err(err) => {
            error!("Failed to resolve '{}': {}", query, err);
            ctx.send(embedded_messages::error(format!(
                "Failed to process audio source: {}",
                err
            )))
            .await?;
            return Ok(());
        }
    };

    let Some(first) = tracks.first().cloned() else {
        ctx.send(embedded_messages::error("Nothing to queue")).await?;
        return Ok(());
    };
    let count = tracks.len();

    let enqueued = match MusicManager::enqueue(
        ctx.serenity_context(),
        ctx.data(),
        guild_id,
        voice_channel,
        ctx.channel_id(),
        tracks,
    )
    .await
    {
        Ok(enqueued) => enqueued,
        Err(err) => {
            error!("Failed to queue tracks in guild {}: {}", guild_id, err);
            ctx.send(embedded_messages::error(format!(
                "Failed to add track to queue: {}",
                err
            )))
            .await?;
            return Ok(());
        }
    };

    ctx.send(CreateReply::default().embed(embedded_messages::added_to_queue(
        &first,
        count,
        enqueued,
    )))
    .await?;

    Ok(())
}
