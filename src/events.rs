use serenity::all::ComponentInteraction;
use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::prelude::*;
use tracing::error;

use crate::Data;
use crate::commands::music::controller::render::CUSTOM_ID_PREFIX;
use crate::commands::music::utils::component_handlers;

pub struct Handler {
    pub data: Data,
}

#[async_trait]
impl serenity::prelude::EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            if component.data.custom_id.starts_with(CUSTOM_ID_PREFIX) {
                controller_interaction(&ctx, &component, &self.data).await;
            }
        }
    }
}

/// Handle component interactions for components with identities starting with "controller_"
async fn controller_interaction(ctx: &Context, component: &ComponentInteraction, data: &Data) {
    if let Err(e) = component_handlers::handle_interaction(ctx, component, data).await {
        error!("Error handling component interaction: {}", e);
    }
}
