//! Spotify lookups that do not touch playback.

use poise::CreateReply;
use tracing::{info, warn};

use crate::commands::music::audio_sources::spotify::SpotifyLink;
use crate::commands::music::utils::embedded_messages;
use crate::{CommandResult, Context};

/// Results shown per lookup.
const RESULT_LIMIT: u32 = 10;

/// Search Spotify for tracks
#[poise::command(slash_command, category = "Music")]
pub async fn search(
    ctx: Context<'_>,
    #[description = "What to look for"] query: String,
) -> CommandResult {
    ctx.defer().await?;

    match ctx.data().spotify.search(&query, RESULT_LIMIT).await {
        Ok(tracks) => {
            info!("Spotify search '{}' returned {} tracks", query, tracks.len());
            let title = format!("🔎 Results for \"{}\"", query);
            ctx.send(CreateReply::default().embed(embedded_messages::track_list(&title, &tracks)))
                .await?;
        }
        Err(err) => {
            warn!("Spotify search failed: {}", err);
            ctx.send(embedded_messages::error(err.to_string())).await?;
        }
    }

    Ok(())
}

/// Recommend tracks similar to a Spotify track
#[poise::command(slash_command, category = "Music")]
pub async fn recommend(
    ctx: Context<'_>,
    #[description = "Spotify track link"] track: String,
) -> CommandResult {
    let seed = match SpotifyLink::parse(&track) {
        Some(link) if link.kind == "track" => link.id,
        _ => {
            ctx.send(embedded_messages::error("Please provide a Spotify track link."))
                .await?;
            return Ok(());
        }
    };

    ctx.defer().await?;

    match ctx
        .data()
        .spotify
        .recommendations(&[seed], RESULT_LIMIT)
        .await
    {
        Ok(tracks) => {
            ctx.send(
                CreateReply::default()
                    .embed(embedded_messages::track_list("✨ Recommended Tracks", &tracks)),
            )
            .await?;
        }
        Err(err) => {
            warn!("Spotify recommendations failed: {}", err);
            ctx.send(embedded_messages::error(err.to_string())).await?;
        }
    }

    Ok(())
}

/// List Spotify browse categories
#[poise::command(slash_command, category = "Music")]
pub async fn categories(ctx: Context<'_>) -> CommandResult {
    ctx.defer().await?;

    match ctx.data().spotify.categories().await {
        Ok(categories) => {
            ctx.send(CreateReply::default().embed(embedded_messages::categories(&categories)))
                .await?;
        }
        Err(err) => {
            warn!("Fetching Spotify categories failed: {}", err);
            ctx.send(embedded_messages::error(err.to_string())).await?;
        }
    }

    Ok(())
}
