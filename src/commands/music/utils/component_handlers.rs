use ::serenity::all::{
    ComponentInteraction, ComponentInteractionDataKind, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, EditMessage,
};
use poise::serenity_prelude::{self as serenity, Context};
use serenity::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use crate::Data;
use crate::commands::music::controller::messages::Messages;
use crate::commands::music::controller::player::{Notice, Notifier, PlayerSnapshot};
use crate::commands::music::controller::render::{self, parse_custom_id};
use crate::commands::music::controller::surface::ControlSurface;
use crate::commands::music::controller::{ControlInteraction, ControllerError};

use super::discord_player::DiscordPlayer;
use super::embedded_messages;
use super::music_manager::MUSIC_MANAGER;

type ComponentResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Answers a controller interaction. The first answer is the interaction
/// response; later ones are follow-ups.
pub struct InteractionNotifier {
    ctx: Context,
    interaction: ComponentInteraction,
    messages: Arc<Messages>,
    responded: AtomicBool,
}

impl InteractionNotifier {
    pub fn new(ctx: Context, interaction: ComponentInteraction, messages: Arc<Messages>) -> Self {
        Self {
            ctx,
            interaction,
            messages,
            responded: AtomicBool::new(false),
        }
    }

    /// True the first time it is called.
    fn first_response(&self) -> bool {
        !self.responded.swap(true, Ordering::SeqCst)
    }

    /// Acknowledges the interaction if nothing answered it yet.
    pub async fn finish(&self) {
        if self.first_response() {
            if let Err(e) = self
                .interaction
                .create_response(&self.ctx.http, CreateInteractionResponse::Acknowledge)
                .await
            {
                warn!("Failed to acknowledge interaction: {}", e);
            }
        }
    }
}

#[async_trait]
impl Notifier for InteractionNotifier {
    async fn send(&self, notice: Notice) {
        let content = self.messages.render(notice.key, &notice.args);

        let result = if self.first_response() {
            let message = CreateInteractionResponseMessage::new()
                .content(content)
                .ephemeral(notice.ephemeral);
            self.interaction
                .create_response(&self.ctx.http, CreateInteractionResponse::Message(message))
                .await
        } else {
            let followup = CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(notice.ephemeral);
            self.interaction
                .create_followup(&self.ctx.http, followup)
                .await
                .map(|_| ())
        };

        if let Err(e) = result {
            warn!("Failed to send '{}' notice: {}", notice.key, e);
        }
    }

    async fn redraw(&self, snapshot: &PlayerSnapshot, surface: ControlSurface) {
        let embed = embedded_messages::player_embed(snapshot, &self.messages);
        let components = render::action_rows(&surface);

        let result = if self.first_response() {
            let message = CreateInteractionResponseMessage::new()
                .embed(embed)
                .components(components);
            self.interaction
                .create_response(
                    &self.ctx.http,
                    CreateInteractionResponse::UpdateMessage(message),
                )
                .await
        } else {
            self.interaction
                .channel_id
                .edit_message(
                    &self.ctx.http,
                    self.interaction.message.id,
                    EditMessage::new().embed(embed).components(components),
                )
                .await
                .map(|_| ())
        };

        if let Err(e) = result {
            warn!("Failed to redraw controller: {}", e);
        }
    }
}

/// 1-based track index chosen in the dropdown.
fn selected_index(interaction: &ComponentInteraction) -> Option<usize> {
    match &interaction.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => {
            values.first().and_then(|value| value.parse().ok())
        }
        _ => None,
    }
}

/// Handle a press on the controller message
pub async fn handle_interaction(
    ctx: &Context,
    interaction: &ComponentInteraction,
    data: &Data,
) -> ComponentResult {
    let guild_id = interaction.guild_id.ok_or("Not in a guild")?;
    let notifier =
        InteractionNotifier::new(ctx.clone(), interaction.clone(), data.messages.clone());

    let Some(kind) = parse_custom_id(&interaction.data.custom_id) else {
        warn!("Unknown controller component: {}", interaction.data.custom_id);
        notifier.finish().await;
        return Ok(());
    };

    let found = {
        let manager = MUSIC_MANAGER.lock().await;
        manager
            .player(guild_id)
            .map(|player| (player.controller.clone(), player.voice_channel))
    };
    let Some((controller, voice_channel)) = found else {
        debug!("Controller pressed in guild {} without a player", guild_id);
        notifier
            .send(Notice::ephemeral("noTrackPlaying", Vec::new()))
            .await;
        return Ok(());
    };

    let player = DiscordPlayer::new(ctx.clone(), guild_id, voice_channel, data.settings.clone());
    let press = ControlInteraction {
        user: interaction.user.id.into(),
        kind,
        selection: selected_index(interaction),
    };

    match controller.handle(press, &player, &notifier).await {
        Ok(()) => (),
        Err(e @ ControllerError::Music(_)) => {
            error!("Controller action {:?} failed in guild {}: {}", kind, guild_id, e);
            notifier.send(e.notice()).await;
        }
        Err(e) => {
            info!("Controller press rejected in guild {}: {}", guild_id, e);
            notifier.send(e.notice()).await;
        }
    }

    notifier.finish().await;
    Ok(())
}
