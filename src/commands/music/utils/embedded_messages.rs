use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{CreateEmbed, CreateEmbedFooter};
use std::time::Duration;

use crate::commands::music::audio_sources::spotify::{SpotifyCategory, SpotifyTrack};
use crate::commands::music::audio_sources::track_metadata::{TrackMetadata, format_duration};
use crate::commands::music::controller::messages::Messages;
use crate::commands::music::controller::player::PlayerSnapshot;

use super::music_manager::Enqueued;

/// Parse the metadata for the now playing and added to queue embeds
fn parse_metadata(metadata: &TrackMetadata) -> (String, String, String) {
    let title = metadata.title.clone();
    let url = metadata.url.clone().unwrap_or_else(|| "#".to_string());
    let duration_str = if metadata.is_stream {
        "Live".to_string()
    } else {
        metadata
            .format_length()
            .unwrap_or_else(|| "Unknown duration".to_string())
    };

    (title, url, duration_str)
}

/// The embed of the controller message.
pub fn player_embed(snapshot: &PlayerSnapshot, messages: &Messages) -> CreateEmbed {
    let Some(current) = &snapshot.current else {
        return CreateEmbed::new()
            .title("🔇 Nothing playing")
            .description(messages.get("noTrackPlaying"))
            .color(0x808080);
    };

    let (title, url, duration_str) = parse_metadata(current);
    let status = if snapshot.is_paused {
        "⏸️ Paused"
    } else {
        "🎵 Now Playing"
    };

    let mut embed = CreateEmbed::new()
        .title(status)
        .description(format!("[{}]({})\nby {}", title, url, current.author))
        .field("Duration", format!("`{}`", duration_str), true)
        .field("Requested by", current.requester.mention(), true)
        .field("Volume", format!("`{}%`", snapshot.volume), true)
        .field("Repeat", format!("`{}`", snapshot.repeat), true)
        .color(0x00ff00);

    if !snapshot.upcoming.is_empty() {
        let total: Duration = snapshot.upcoming.iter().filter_map(|t| t.duration).sum();
        let queue_info = if total.as_secs() > 0 {
            format!(
                "`{} tracks` • Total Length: `{}`",
                snapshot.upcoming.len(),
                format_duration(total)
            )
        } else {
            format!("`{} tracks`", snapshot.upcoming.len())
        };
        embed = embed.field("Up Next", queue_info, false);
    }

    if let Some(thumbnail) = &current.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    embed
}

/// Create an embed for tracks added to the queue. When playback started
/// with them the embed announces the first track as playing.
pub fn added_to_queue(first: &TrackMetadata, count: usize, enqueued: Enqueued) -> CreateEmbed {
    let (title, url, duration_str) = parse_metadata(first);

    let heading = match (enqueued.started, count) {
        (true, 1) => "🎶 Now Playing".to_string(),
        (true, _) => format!("🎶 Now Playing, {} tracks queued", count),
        (false, 1) => "🎵 Added to Queue".to_string(),
        (false, _) => format!("🎵 Added {} tracks to Queue", count),
    };

    let mut embed = if count == 1 {
        CreateEmbed::new()
            .title(heading)
            .description(format!("[{}]({})", title, url))
            .field("Duration", format!("`{}`", duration_str), true)
    } else {
        CreateEmbed::new()
            .title(heading)
            .description(format!("Starting with [{}]({})", title, url))
    };
    if !enqueued.started {
        embed = embed.field("Position", format!("`#{}`", enqueued.position), true);
    }
    embed = embed
        .footer(CreateEmbedFooter::new(format!(
            "Requested by {}",
            first.requester_name
        )))
        .color(0x00ff00);

    if let Some(thumbnail) = &first.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

/// Numbered list of Spotify tracks.
pub fn track_list(title: &str, tracks: &[SpotifyTrack]) -> CreateEmbed {
    let description = if tracks.is_empty() {
        "**📭 No tracks found**".to_string()
    } else {
        tracks
            .iter()
            .enumerate()
            .map(|(index, track)| {
                format!(
                    "`{}.` [{}]({}) - {} `{}`",
                    index + 1,
                    track.name,
                    track.url,
                    track.artists.join(", "),
                    format_duration(track.duration)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(0x1db954)
}

/// Browse categories, one per line.
pub fn categories(categories: &[SpotifyCategory]) -> CreateEmbed {
    let description = categories
        .iter()
        .map(|category| format!("• {} (`{}`)", category.name, category.id))
        .collect::<Vec<_>>()
        .join("\n");

    // Embed descriptions are capped at 4096 characters.
    let description: String = description.chars().take(4096).collect();

    CreateEmbed::new()
        .title(format!("🎧 Spotify Categories ({})", categories.len()))
        .description(description)
        .color(0x1db954)
}

/// Create an error reply
pub fn error(description: impl Into<String>) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(description)
                .color(0xff0000),
        )
        .ephemeral(true)
}
